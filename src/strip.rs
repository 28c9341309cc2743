/// Removes `//` line comments and `/* */` block comments from `text`.
///
/// Comment characters are blanked rather than deleted: newlines are kept and every
/// other byte becomes a space, so byte offsets and line numbers in the result
/// match the original text. An unterminated block comment runs to the end of the text.
pub fn strip_comments(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                blank(&mut result, c);
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    blank(&mut result, next);
                    chars.next();
                }
            },
            ('/', Some('*')) => {
                blank(&mut result, c);
                let star = chars.next().unwrap_or('*');
                blank(&mut result, star);
                let mut prev = '\0';
                for next in chars.by_ref() {
                    blank(&mut result, next);
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            },
            _ => result.push(c),
        }
    }
    result
}

fn blank(result: &mut String, c: char) {
    if c == '\n' {
        result.push('\n');
    } else {
        for _ in 0..c.len_utf8() {
            result.push(' ');
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn line_comments() {
        let text = "wire a; // the a wire\nwire b;";
        let stripped = strip_comments(text);
        assert_eq!(stripped, format!("wire a; {}\nwire b;", " ".repeat(13)));
        assert_eq!(stripped.len(), text.len());
    }

    #[test]
    fn block_comments() {
        let text = "assign /* one\ntwo */ y = a;";
        let stripped = strip_comments(text);
        assert_eq!(stripped, format!("assign {}\n{} y = a;", " ".repeat(6), " ".repeat(6)));
    }

    #[test]
    fn unterminated_block_comment() {
        assert_eq!(strip_comments("a /* b"), format!("a {}", " ".repeat(4)));
    }

    #[test]
    fn division_is_not_a_comment() {
        assert_eq!(strip_comments("assign y = a / b;"), "assign y = a / b;");
    }

    #[test]
    fn multibyte_characters_keep_offsets() {
        let text = "a // héllo\nb";
        let stripped = strip_comments(text);
        assert_eq!(stripped.len(), text.len());
        assert!(stripped.ends_with("\nb"));
    }

    #[test]
    fn star_slash_needs_opening() {
        assert_eq!(strip_comments("/**/x"), "    x");
    }
}
