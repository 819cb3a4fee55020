use crate::error::TaskError;

/// A line-oriented cursor over the finite-domain task format (spec.md §9.5): every field of the
/// format occupies its own line, so a plain line iterator with a 1-based counter (for error
/// messages) is all the parser needs.
pub struct Lexer<'a> {
    lines: std::str::Lines<'a>,
    line_no: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { lines: input.lines(), line_no: 0 }
    }

    pub fn line_no(&self) -> usize {
        self.line_no
    }

    fn raw_next(&mut self) -> Option<&'a str> {
        let line = self.lines.next()?;
        self.line_no += 1;
        Some(line)
    }

    /// Next non-empty line, trimmed. Blank lines are not meaningful in this format and are
    /// skipped defensively, though a well-formed task never emits them.
    pub fn next_line(&mut self, expected: &'static str) -> Result<&'a str, TaskError> {
        loop {
            match self.raw_next() {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => return Ok(line.trim()),
                None => return Err(TaskError::UnexpectedEof { expected }),
            }
        }
    }

    pub fn expect(&mut self, tag: &'static str) -> Result<(), TaskError> {
        let line = self.next_line(tag)?;
        if line != tag {
            return Err(TaskError::UnexpectedToken { line: self.line_no, expected: tag, found: line.to_string() });
        }
        Ok(())
    }

    pub fn next_int<T: std::str::FromStr>(&mut self, expected: &'static str) -> Result<T, TaskError> {
        let line = self.next_line(expected)?;
        line.parse::<T>().map_err(|_| TaskError::ExpectedInt { line: self.line_no, found: line.to_string() })
    }

    /// Parses a line of the form `"<a> <b>"` into two integers (used for precondition/effect
    /// `var val` pairs and goal literals).
    pub fn next_int_pair(&mut self, expected: &'static str) -> Result<(i64, i64), TaskError> {
        let line = self.next_line(expected)?;
        let mut it = line.split_whitespace();
        let a = it
            .next()
            .ok_or_else(|| TaskError::ExpectedInt { line: self.line_no, found: line.to_string() })?;
        let b = it
            .next()
            .ok_or_else(|| TaskError::ExpectedInt { line: self.line_no, found: line.to_string() })?;
        let a = a.parse().map_err(|_| TaskError::ExpectedInt { line: self.line_no, found: a.to_string() })?;
        let b = b.parse().map_err(|_| TaskError::ExpectedInt { line: self.line_no, found: b.to_string() })?;
        Ok((a, b))
    }
}
