use std::io::BufRead;

/// Raw arguments read from the stdin protocol: a version line, a stage line
/// and the shader source as the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamArguments {
    pub version: String,
    pub stage: String,
    pub source: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to read version argument")]
    MissingVersion,
    #[error("Failed to read stage argument")]
    MissingStage,
    #[error("Empty shader source")]
    EmptySource,
    #[error("failed to read standard input: {0}")]
    Io(#[from] std::io::Error),
}

pub fn read_stream_arguments<R: BufRead>(reader: R) -> Result<StreamArguments, InputError> {
    let mut lines = reader.lines();
    let version = lines.next().ok_or(InputError::MissingVersion)??;
    let stage = lines.next().ok_or(InputError::MissingStage)??;

    let mut source = String::new();
    for line in lines {
        source.push_str(&line?);
        source.push('\n');
    }
    if source.is_empty() {
        return Err(InputError::EmptySource);
    }

    Ok(StreamArguments {
        version,
        stage,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_header_lines_from_source() {
        let input = "450\n4\n#version 450\nvoid main() {}";
        let args = read_stream_arguments(input.as_bytes()).unwrap();
        assert_eq!(args.version, "450");
        assert_eq!(args.stage, "4");
        assert_eq!(args.source, "#version 450\nvoid main() {}\n");
    }

    #[test]
    fn reports_missing_lines_in_order() {
        assert!(matches!(
            read_stream_arguments("".as_bytes()),
            Err(InputError::MissingVersion)
        ));
        assert!(matches!(
            read_stream_arguments("450\n".as_bytes()),
            Err(InputError::MissingStage)
        ));
        assert!(matches!(
            read_stream_arguments("450\n4\n".as_bytes()),
            Err(InputError::EmptySource)
        ));
    }

    #[test]
    fn blank_source_line_is_not_empty() {
        let args = read_stream_arguments("450\n4\n\n".as_bytes()).unwrap();
        assert_eq!(args.source, "\n");
    }
}
