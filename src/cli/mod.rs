//! Command line interface

pub mod args;
pub mod output;

pub use args::*;
pub use output::OutputFormatter;

use std::io::{self, Read};

/// Read a script from a file, or from stdin when `input` is `-`
pub fn read_input(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packed.js");
        std::fs::write(&path, "eval(x)").unwrap();

        assert_eq!(read_input(path.to_str().unwrap()).unwrap(), "eval(x)");
        assert!(read_input(dir.path().join("missing.js").to_str().unwrap()).is_err());
    }
}
