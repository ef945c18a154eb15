mod cli;
mod commands;
mod infra;

use rental_choice::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
