//! LaTeX-safe rendering of field values.

/// Characters that must be backslash-escaped in BibTeX output.
const SPECIAL_CHARS: [char; 4] = ['&', '%', '#', '_'];

/// Hyphen-minus, hyphen, non-breaking hyphen, en dash, em dash and minus sign.
pub(crate) const PAGE_SEPARATORS: [char; 6] = ['-', '\u{2010}', '\u{2011}', '\u{2013}', '\u{2014}', '\u{2212}'];

/// Escape LaTeX special characters and replace accented letters by their
/// LaTeX commands, e.g. `é` becomes `{\'e}`.
///
/// Characters already preceded by a backslash are left alone, so applying
/// the function twice gives the same result as applying it once.
///
/// ```
/// use btcleaner::bibtex::latex_escape;
///
/// assert_eq!(latex_escape("Cats & Dogs"), r"Cats \& Dogs");
/// assert_eq!(latex_escape(r"Cats \& Dogs"), r"Cats \& Dogs");
/// assert_eq!(latex_escape("Revue Médicale"), r"Revue M{\'e}dicale");
/// ```
pub fn latex_escape(text: &str) -> String {
    escape(text, true)
}

/// Backslash-escape `& % # _` only, leaving every other character as is.
pub(crate) fn escape_specials(text: &str) -> String {
    escape(text, false)
}

fn escape(text: &str, accents: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut previous = None;
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) && previous != Some('\\') {
            escaped.push('\\');
            escaped.push(c);
        } else if let Some(command) = accent_command(c).filter(|_| accents) {
            escaped.push_str(command);
        } else {
            escaped.push(c);
        }
        previous = Some(c);
    }
    escaped
}

fn accent_command(c: char) -> Option<&'static str> {
    let command = match c {
        'à' => r"{\`a}",
        'á' => r"{\'a}",
        'â' => r"{\^a}",
        'ä' => r#"{\"a}"#,
        'ã' => r"{\~a}",
        'å' => r"{\aa}",
        'æ' => r"{\ae}",
        'ç' => r"{\c c}",
        'è' => r"{\`e}",
        'é' => r"{\'e}",
        'ê' => r"{\^e}",
        'ë' => r#"{\"e}"#,
        'ì' => r"{\`i}",
        'í' => r"{\'i}",
        'î' => r"{\^i}",
        'ï' => r#"{\"i}"#,
        'ñ' => r"{\~n}",
        'ò' => r"{\`o}",
        'ó' => r"{\'o}",
        'ô' => r"{\^o}",
        'ö' => r#"{\"o}"#,
        'õ' => r"{\~o}",
        'ø' => r"{\o}",
        'œ' => r"{\oe}",
        'ß' => r"{\ss}",
        'ù' => r"{\`u}",
        'ú' => r"{\'u}",
        'û' => r"{\^u}",
        'ü' => r#"{\"u}"#,
        'ý' => r"{\'y}",
        'ÿ' => r#"{\"y}"#,
        'À' => r"{\`A}",
        'Á' => r"{\'A}",
        'Â' => r"{\^A}",
        'Ä' => r#"{\"A}"#,
        'Ã' => r"{\~A}",
        'Å' => r"{\AA}",
        'Æ' => r"{\AE}",
        'Ç' => r"{\c C}",
        'È' => r"{\`E}",
        'É' => r"{\'E}",
        'Ê' => r"{\^E}",
        'Ë' => r#"{\"E}"#,
        'Ì' => r"{\`I}",
        'Í' => r"{\'I}",
        'Î' => r"{\^I}",
        'Ï' => r#"{\"I}"#,
        'Ñ' => r"{\~N}",
        'Ò' => r"{\`O}",
        'Ó' => r"{\'O}",
        'Ô' => r"{\^O}",
        'Ö' => r#"{\"O}"#,
        'Õ' => r"{\~O}",
        'Ø' => r"{\O}",
        'Œ' => r"{\OE}",
        'Ù' => r"{\`U}",
        'Ú' => r"{\'U}",
        'Û' => r"{\^U}",
        'Ü' => r#"{\"U}"#,
        'Ý' => r"{\'Y}",
        _ => return None,
    };
    Some(command)
}

/// Rewrite a page range `first-last` as `first--last`.
///
/// Any hyphen or dash separates the parts, so `100–110` is rewritten too.
/// Surrounding whitespace is dropped, runs of dashes collapse, and a range
/// with more than two parts keeps only its ends. Values without a complete
/// range are returned unchanged.
///
/// ```
/// use btcleaner::bibtex::page_double_hyphen;
///
/// assert_eq!(page_double_hyphen("100-110"), "100--110");
/// assert_eq!(page_double_hyphen("100--110"), "100--110");
/// assert_eq!(page_double_hyphen("e1234"), "e1234");
/// ```
pub fn page_double_hyphen(pages: &str) -> String {
    let parts: Vec<&str> = pages
        .split(&PAGE_SEPARATORS[..])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    match parts.as_slice() {
        [first, .., last] => format!("{first}--{last}"),
        _ => pages.to_string(),
    }
}
