/// Tokens produced by the Gerber lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum GerberToken {
    /// Extended command block (contents between `%` delimiters).
    /// Example: `"FSLAX24Y24"`, `"ADD10C,0.020"`, `"LPD"`
    Extended(String),
    /// A word command terminated by `*`.
    /// Example: `"D10"`, `"X100Y200D01"`, `"G01"`, `"M02"`
    Word(String),
}

/// Tokenize a Gerber file into a sequence of tokens.
///
/// Gerber uses `*` as a statement terminator and `%...*%` for extended commands.
/// Comments start with `G04` and end with `*`.
pub fn tokenize(input: &str) -> Vec<GerberToken> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            '%' => {
                chars.next(); // consume '%'
                              // Read until closing '%', collecting extended command blocks
                let mut block = String::new();
                loop {
                    match chars.peek() {
                        Some(&'%') => {
                            chars.next(); // consume closing '%'
                                          // Emit any remaining content as a block
                            let trimmed = block.trim().to_string();
                            if !trimmed.is_empty() && !is_comment(&trimmed) {
                                tokens.push(GerberToken::Extended(trimmed));
                            }
                            break;
                        }
                        Some(&'*') => {
                            chars.next(); // consume '*'
                                          // End of one extended command within the block
                            let trimmed = block.trim().to_string();
                            if !trimmed.is_empty() && !is_comment(&trimmed) {
                                tokens.push(GerberToken::Extended(trimmed));
                            }
                            block.clear();
                        }
                        Some(&c) => {
                            chars.next();
                            if c != '\n' && c != '\r' {
                                block.push(c);
                            }
                        }
                        None => break, // EOF inside extended block
                    }
                }
            }
            '\n' | '\r' | ' ' | '\t' => {
                chars.next(); // skip whitespace
            }
            _ => {
                // Read a word command until '*'
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '*' {
                        chars.next(); // consume '*'
                        break;
                    }
                    if c == '%' {
                        break; // don't consume, let outer loop handle
                    }
                    chars.next();
                    if c != '\n' && c != '\r' {
                        word.push(c);
                    }
                }
                let trimmed = word.trim().to_string();
                if !trimmed.is_empty() && !is_comment(&trimmed) {
                    tokens.push(GerberToken::Word(trimmed));
                }
            }
        }
    }

    tokens
}

/// Check if a command is a G04 comment.
fn is_comment(s: &str) -> bool {
    s.starts_with("G04") || s.starts_with("G4")
}
