/// Statement keywords in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Assign,
    Def,
    Call,
    Input,
    InputStr,
    Mult,
    Repeat,
    WriteL,
    Reverse,
    Write,
    While,
}

const PRIORITY: [Keyword; 11] = [
    Keyword::Assign,
    Keyword::Def,
    Keyword::Call,
    Keyword::Input,
    Keyword::InputStr,
    Keyword::Mult,
    Keyword::Repeat,
    Keyword::WriteL,
    Keyword::Reverse,
    Keyword::Write,
    Keyword::While,
];

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Assign => "assign",
            Keyword::Def => "def",
            Keyword::Call => "call",
            Keyword::Input => "input",
            Keyword::InputStr => "inputStr",
            Keyword::Mult => "mult",
            Keyword::Repeat => "repeat",
            Keyword::WriteL => "writeL",
            Keyword::Reverse => "reverse",
            Keyword::Write => "write",
            Keyword::While => "while",
        }
    }

    /// Fewest whitespace-separated tokens, keyword included, for a usable
    /// statement.
    fn min_tokens(&self) -> usize {
        match self {
            Keyword::Repeat => 1,
            Keyword::Def
            | Keyword::Call
            | Keyword::Input
            | Keyword::InputStr
            | Keyword::WriteL
            | Keyword::Reverse
            | Keyword::Write => 2,
            Keyword::Assign => 3,
            Keyword::Mult => 4,
            Keyword::While => 6,
        }
    }

    /// Finds the keyword a line starts with.
    ///
    /// Matching is by plain prefix in priority order, except that a first
    /// token of exactly `inputStr` is claimed before the `input` prefix.
    pub fn detect(line: &str) -> Option<Keyword> {
        if line.split_whitespace().next() == Some(Keyword::InputStr.as_str()) {
            return Some(Keyword::InputStr);
        }
        PRIORITY
            .iter()
            .copied()
            .find(|keyword| line.starts_with(keyword.as_str()))
    }
}

fn take(tokens: &mut impl Iterator<Item = String>) -> String {
    tokens.next().unwrap_or_default()
}

/// Header of a fixed-shape loop:
/// `while <control> <condition> <bound> <step> <report>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileLoop {
    pub control: String,
    pub condition: String,
    pub bound: String,
    pub step: String,
    pub report: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Assign { name: String, value: String },
    Def { name: String, params: Vec<String> },
    Call { name: String, args: Vec<String> },
    Input { name: String },
    InputStr { name: String },
    Mult { left: String, right: String, dest: String },
    Repeat,
    WriteL { name: String },
    Reverse { name: String },
    Write { words: Vec<String> },
    While(WhileLoop),
    /// A bare alphabetic identifier.
    Lookup { name: String },
    /// A keyword matched but required tokens are missing.
    Malformed(Keyword),
    /// Nothing recognizable; skipped without output.
    Ignored,
}

impl Statement {
    pub fn classify(line: &str) -> Statement {
        let Some(keyword) = Keyword::detect(line) else {
            let name = line.trim();
            if !name.is_empty() && name.chars().all(char::is_alphabetic) {
                return Statement::Lookup {
                    name: name.to_string(),
                };
            }
            return Statement::Ignored;
        };

        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if tokens.len() < keyword.min_tokens() {
            return Statement::Malformed(keyword);
        }

        let mut rest = tokens.into_iter().skip(1);

        match keyword {
            Keyword::Assign => Statement::Assign {
                name: take(&mut rest),
                value: take(&mut rest),
            },
            Keyword::Def => {
                let name = take(&mut rest);
                Statement::Def {
                    name,
                    params: rest.collect(),
                }
            }
            Keyword::Call => {
                let name = take(&mut rest);
                Statement::Call {
                    name,
                    args: rest.collect(),
                }
            }
            Keyword::Input => Statement::Input { name: take(&mut rest) },
            Keyword::InputStr => Statement::InputStr { name: take(&mut rest) },
            Keyword::Mult => Statement::Mult {
                left: take(&mut rest),
                right: take(&mut rest),
                dest: take(&mut rest),
            },
            Keyword::Repeat => Statement::Repeat,
            Keyword::WriteL => Statement::WriteL { name: take(&mut rest) },
            Keyword::Reverse => Statement::Reverse { name: take(&mut rest) },
            Keyword::Write => Statement::Write {
                words: rest.collect(),
            },
            Keyword::While => Statement::While(WhileLoop {
                control: take(&mut rest),
                condition: take(&mut rest),
                bound: take(&mut rest),
                step: take(&mut rest),
                report: take(&mut rest),
            }),
        }
    }
}
