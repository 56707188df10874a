use std::io::{self, Write};

use serde::Serialize;

use crate::app::PrepareOutcome;
use crate::viz::VizOutcome;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_prepare(outcome: &PrepareOutcome) -> io::Result<()> {
        Self::print_json(outcome)
    }

    pub fn print_visualize(outcome: &VizOutcome) -> io::Result<()> {
        Self::print_json(outcome)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
