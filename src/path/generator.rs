use super::PathCommand;

/// Format a number for path data
///
/// Uses the shortest representation that reads back to the same `f64`, so
/// generated text parses to exactly the commands it came from. Negative zero
/// is written as `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// Write commands as canonical path text
///
/// Every command is written with an absolute uppercase letter and its full
/// argument list; no shorthand is used.
pub fn generate_path(commands: &[PathCommand]) -> String {
    commands
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Point2;
    use crate::path::{ArcTo, parse_path};

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(1e-7), "0.0000001");
    }

    #[test]
    fn test_generate_square() {
        let commands = vec![
            PathCommand::MoveTo(Point2::new(0.0, 0.0)),
            PathCommand::LineTo(Point2::new(1.0, 0.0)),
            PathCommand::LineTo(Point2::new(1.0, 1.0)),
            PathCommand::LineTo(Point2::new(0.0, 1.0)),
            PathCommand::ClosePath,
        ];
        assert_eq!(generate_path(&commands), "M 0 0 L 1 0 L 1 1 L 0 1 Z");
    }

    #[test]
    fn test_generated_text_parses_back() {
        let commands = vec![
            PathCommand::MoveTo(Point2::new(0.1, -3.25)),
            PathCommand::ArcTo(ArcTo {
                rx: 2.0 / 3.0,
                ry: 1e-7,
                rotation: -30.0,
                large_arc: true,
                sweep: false,
                end: Point2::new(12345.678, 1e21),
            }),
            PathCommand::ClosePath,
            PathCommand::MoveTo(Point2::new(5.0, 5.0)),
        ];
        let text = generate_path(&commands);
        assert_eq!(parse_path(&text).unwrap(), commands);
    }
}
