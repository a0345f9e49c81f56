/// get the newline delimiter (e.g. CRLF for Windows, LF for Linux). of multi-line text.
pub(crate) fn newline_delimiter_of(text: &str) -> &'static str {
    // find the first '\n', then check whether the character before it is '\r'
    if text
        .find('\n')
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| text.get(i..i + 1))
        .is_some_and(|x| x == "\r")
    {
        "\r\n"
    } else {
        "\n"
    }
}

/// Rewrite LF-delimited text to use `newline` between lines.
pub(crate) fn with_newline(text: String, newline: &str) -> String {
    if newline == "\n" {
        text
    } else {
        text.replace('\n', newline)
    }
}
