use super::{AliasTable, OptionGroupParser, ParseState};
use crate::config::LayeredConfig;
use crate::error::{CrawlError, Result};
use crate::observer::SessionObserver;
use std::path::PathBuf;

/// Output format, output file and encodings.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptionsParser;

impl OptionGroupParser for OutputOptionsParser {
    fn name(&self) -> &'static str {
        "output"
    }

    fn aliases(&self) -> AliasTable {
        &[("outputformat", &["fmt"]), ("outputfile", &["o"])]
    }

    fn apply(
        &self,
        config: &mut LayeredConfig,
        state: &mut ParseState,
        _observer: &dyn SessionObserver,
    ) -> Result<()> {
        let output = &mut state.output;

        if config.has_value("outputformat") {
            let format = config.get_string("outputformat", "");
            if format.trim().is_empty() {
                return Err(CrawlError::config("outputformat", "an output format is required"));
            }
            output.format = format.trim().to_string();
            config.consume("outputformat");
        }
        if config.has_value("outputfile") {
            let path = config.get_string("outputfile", "");
            if path.trim().is_empty() {
                return Err(CrawlError::config("outputfile", "an output file path is required"));
            }
            output.output_file = Some(PathBuf::from(path));
            config.consume("outputfile");
        }
        for key in ["inputencoding", "outputencoding"] {
            if !config.has_value(key) {
                continue;
            }
            let encoding = config.get_string(key, "");
            if encoding.trim().is_empty() {
                return Err(CrawlError::config(key, "an encoding name is required"));
            }
            if key == "inputencoding" {
                output.input_encoding = encoding;
            } else {
                output.output_encoding = encoding;
            }
            config.consume(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OutputOptions;
    use crate::parsers::test_support::{apply, command_line};

    #[test]
    fn test_defaults() {
        let mut config = command_line(&[]);
        let mut state = ParseState::default();
        apply(&OutputOptionsParser, &mut config, &mut state).unwrap();
        assert_eq!(state.output, OutputOptions::default());
        assert_eq!(state.output.format, "text");
        assert_eq!(state.output.output_encoding, "UTF-8");
    }

    #[test]
    fn test_aliases() {
        let mut config = command_line(&[
            ("fmt", Some("json")),
            ("o", Some("report.json")),
            ("outputencoding", Some("ISO-8859-1")),
        ]);
        let mut state = ParseState::default();
        apply(&OutputOptionsParser, &mut config, &mut state).unwrap();

        assert_eq!(state.output.format, "json");
        assert_eq!(state.output.output_file, Some(PathBuf::from("report.json")));
        assert_eq!(state.output.input_encoding, "UTF-8");
        assert_eq!(state.output.output_encoding, "ISO-8859-1");
        assert!(config.is_consumed("outputfile"));
    }

    #[test]
    fn test_value_required() {
        let mut config = command_line(&[("outputfile", None)]);
        let error = apply(&OutputOptionsParser, &mut config, &mut ParseState::default())
            .unwrap_err();
        assert!(matches!(error, CrawlError::Config { ref key, .. } if key == "outputfile"));
    }
}
