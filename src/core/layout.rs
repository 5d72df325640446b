//! Line layout and brace indentation for decoded player scripts

/// Indentation unit applied once per brace level
pub const INDENT: char = '\t';

/// Break a single-line payload into brace-delimited lines and indent them.
///
/// Statement terminators end a line, every brace sits on its own line, and the
/// empty lines produced by those insertions are collapsed. Braces inside string
/// literals are counted like structural ones.
pub fn reformat(payload: &str) -> String {
    let broken = payload
        .replace(';', ";\n")
        .replace('{', "\n{\n")
        .replace('}', "\n}\n")
        .replace("\n;\n", ";\n")
        .replace("\n\n", "\n");

    let lines: Vec<&str> = broken.split('\n').collect();
    indent(&lines).join("\n")
}

/// Prefix each line with one [`INDENT`] per brace level.
///
/// The level is the depth after applying the line's own braces, so an opening
/// brace is indented with its block and a closing brace with the enclosing
/// block. Depth saturates at zero on unmatched closing braces.
pub fn indent(lines: &[&str]) -> Vec<String> {
    let mut depth: usize = 0;

    lines
        .iter()
        .map(|line| {
            if line.contains('{') {
                depth += 1;
            }
            if line.contains('}') {
                depth = depth.saturating_sub(1);
            }

            let mut out = String::with_capacity(line.len() + depth);
            out.extend(std::iter::repeat(INDENT).take(depth));
            out.push_str(line);
            out
        })
        .collect()
}

/// Count the leading indentation units of a formatted line
pub fn indent_level(line: &str) -> usize {
    line.chars().take_while(|c| *c == INDENT).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_reformat_function() {
        let out = reformat("function f(a){var b=1;return a+b}");
        assert_eq!(out, "function f(a)\n\t{\n\tvar b=1;\n\treturn a+b\n}\n");
    }

    #[test]
    fn test_reformat_collapses_terminator_after_brace() {
        let out = reformat("var o={a:1};x();");
        assert_eq!(out, "var o=\n\t{\n\ta:1\n};\nx();\n");
    }

    #[test]
    fn test_reformat_preserves_characters() {
        let payload = r#"jwplayer("vplayer").setup({sources:[{file:"https://x.example/master.m3u8"}],image:"https://x.example/p.jpg",playbackRates:[0.5,1,2]});var a=1;if(a){b()}else{c()}"#;
        let out = reformat(payload);
        assert_eq!(strip_whitespace(&out), strip_whitespace(payload));
    }

    #[test]
    fn test_indent_tracks_depth_after_own_braces() {
        let payload = "a{b{c;}d;}e;";
        let out = reformat(payload);

        let mut depth: usize = 0;
        for line in out.lines() {
            let body = line.trim_start_matches(INDENT);
            if body.contains('{') {
                depth += 1;
            }
            if body.contains('}') {
                depth = depth.saturating_sub(1);
            }
            assert_eq!(indent_level(line), depth, "line {:?}", line);
        }
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_unmatched_closing_brace_saturates() {
        let lines = indent(&["}", "}", "{", "x"]);
        assert_eq!(lines, vec!["}", "}", "\t{", "\tx"]);
    }

    #[test]
    fn test_braces_in_strings_are_counted() {
        let out = reformat(r#"var s="{";x();"#);
        let last = out.lines().filter(|l| !l.trim().is_empty()).last().unwrap();
        assert_eq!(indent_level(last), 1);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(reformat(""), "");
    }
}
