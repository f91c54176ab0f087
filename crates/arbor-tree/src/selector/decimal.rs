use crate::number::{NAN, Number};

/// Symbols used when numbers are converted to and from text.
pub trait DecimalNumberContext {
    fn decimal_point(&self) -> char;

    fn exponent_symbol(&self) -> char;

    fn grouping_separator(&self) -> char;

    fn minus_sign(&self) -> char;

    fn plus_sign(&self) -> char;

    fn percentage_symbol(&self) -> char;

    fn format_number(&self, number: Number) -> String {
        number
            .to_string()
            .chars()
            .map(|c| match c {
                '.' => self.decimal_point(),
                '-' => self.minus_sign(),
                c => c,
            })
            .collect()
    }

    /// Parses `text` with these symbols, returning NaN when it is not a
    /// number. Grouping separators are skipped and a trailing percentage
    /// symbol divides by a hundred.
    fn parse_number(&self, text: &str) -> Number {
        let text = text.trim();
        let (text, scale) = match text.strip_suffix(self.percentage_symbol()) {
            Some(text) => (text.trim_end(), 100.0),
            None => (text, 1.0),
        };

        let mut normalized = String::with_capacity(text.len());
        let mut digits = 0;
        let mut previous = None;

        for (i, c) in text.chars().enumerate() {
            let after_exponent = previous == Some('e');

            let mapped = if c.is_ascii_digit() {
                digits += 1;
                c
            } else if c == self.decimal_point() {
                '.'
            } else if c == self.minus_sign() && (i == 0 || after_exponent) {
                '-'
            } else if c == self.plus_sign() && (i == 0 || after_exponent) {
                '+'
            } else if c.eq_ignore_ascii_case(&self.exponent_symbol()) && digits > 0 {
                'e'
            } else if c == self.grouping_separator() && digits > 0 {
                continue;
            } else {
                return NAN;
            };

            normalized.push(mapped);
            previous = Some(mapped);
        }

        if digits == 0 {
            return NAN;
        }

        normalized
            .parse::<f64>()
            .map(|n| Number::new(n / scale))
            .unwrap_or(NAN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalNumberSymbols {
    pub decimal_point: char,
    pub exponent_symbol: char,
    pub grouping_separator: char,
    pub minus_sign: char,
    pub plus_sign: char,
    pub percentage_symbol: char,
}

impl Default for DecimalNumberSymbols {
    fn default() -> Self {
        Self {
            decimal_point: '.',
            exponent_symbol: 'E',
            grouping_separator: ',',
            minus_sign: '-',
            plus_sign: '+',
            percentage_symbol: '%',
        }
    }
}

impl DecimalNumberContext for DecimalNumberSymbols {
    fn decimal_point(&self) -> char {
        self.decimal_point
    }

    fn exponent_symbol(&self) -> char {
        self.exponent_symbol
    }

    fn grouping_separator(&self) -> char {
        self.grouping_separator
    }

    fn minus_sign(&self) -> char {
        self.minus_sign
    }

    fn plus_sign(&self) -> char {
        self.plus_sign
    }

    fn percentage_symbol(&self) -> char {
        self.percentage_symbol
    }
}
