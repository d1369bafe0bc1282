use std::process::ExitCode;

use formkit_core::rules::id_number::is_id_number;

pub fn id_check(value: &str) -> ExitCode {
    let value = value.trim();
    if is_id_number(value) {
        println!("valid");
        ExitCode::SUCCESS
    } else {
        tracing::debug!(value, "ID number rejected");
        println!("invalid");
        ExitCode::FAILURE
    }
}
