//! Commands of the console, one per input line.
use function_name::named;
use lexenv_structs::error::{LexError, Result};
use lexenv_structs::frame::Bindings;
use lexenv_structs::number::Number;
use lexenv_structs::value::{Value, NIL, TRUE};
use std::fmt::{Display, Formatter};

pub const HELP: &str = "\
commands:
  let <name>=<value>...    enter a detached scope with the given bindings
  let! <name>=<value>...   enter a scope discarded when it ends
  get <name>               value of the innermost binding of <name>
  set <name> <value>       write the innermost binding of <name>
  update <name> <op> <n>   apply +, - or * <n> to a numeric binding
  show                     frames of the active chain, innermost first
  tree                     environment tree containing the active frame
  free                     tear down the active frame and leave its scope
  end                      leave the current scope
  help                     this message
  quit                     leave the console";

/// Arithmetic applied by `update`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
}

impl Op {
    #[named]
    pub fn apply(&self, value: Value, operand: &Number) -> Result<Value> {
        let n = Number::try_from(&value).map_err(|e| e.chain(function_name!()))?;
        let result = match self {
            Op::Add => &n + operand,
            Op::Sub => &n - operand,
            Op::Mul => &n * operand,
        };
        Ok(result.into())
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
        };
        write!(f, "{}", str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Let { bindings: Bindings, bound: bool },
    Get(String),
    Set(String, Value),
    Update(String, Op, Number),
    Show,
    Tree,
    Free,
    End,
    Help,
    Quit,
    Empty,
}

impl Command {
    #[named]
    pub fn parse(line: &str) -> Result<Command> {
        let tokens = tokenize(line).map_err(|e| e.chain(function_name!()))?;
        let (head, args) = match tokens.split_first() {
            Some((head, args)) => (head.as_str(), args),
            None => return Ok(Command::Empty),
        };
        let command = match (head, args) {
            ("let", bindings) | ("let!", bindings) => Command::Let {
                bindings: parse_bindings(bindings)?,
                bound: head == "let!",
            },
            ("get", [name]) => Command::Get(name.clone()),
            ("set", [name, value]) => Command::Set(name.clone(), parse_value(value)),
            ("update", [name, op, operand]) => {
                let op = match op.as_str() {
                    "+" => Op::Add,
                    "-" => Op::Sub,
                    "*" => Op::Mul,
                    other => {
                        return Err(LexError::new(
                            function_name!(),
                            format!("unknown operator {}, expected +, - or *", other),
                        ))
                    }
                };
                let operand = Number::try_from(&parse_value(operand))
                    .map_err(|e| e.chain(function_name!()))?;
                Command::Update(name.clone(), op, operand)
            }
            ("show", []) => Command::Show,
            ("tree", []) => Command::Tree,
            ("free", []) => Command::Free,
            ("end", []) => Command::End,
            ("help", []) => Command::Help,
            ("quit", []) | ("exit", []) => Command::Quit,
            (head, args) => {
                return Err(LexError::new(
                    function_name!(),
                    format!(
                        "cannot parse \"{}\" with {} argument(s), type help",
                        head,
                        args.len()
                    ),
                ))
            }
        };
        Ok(command)
    }
}

/// Splits a line on whitespace, keeping double quoted strings (quotes
/// included) in one token.
#[named]
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = vec![];
    let mut current = String::new();
    let mut in_string = false;
    for c in line.chars() {
        match c {
            '"' => {
                in_string = !in_string;
                current.push(c);
            }
            c if c.is_whitespace() && !in_string => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if in_string {
        return Err(LexError::new(function_name!(), "unterminated string"));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

#[named]
fn parse_bindings(tokens: &[String]) -> Result<Bindings> {
    let mut bindings = Bindings::new();
    for token in tokens {
        match token.split_once('=') {
            Some((name, _)) if bindings.contains_key(name) => {
                return Err(LexError::new(
                    function_name!(),
                    format!("{} is bound twice", name),
                ))
            }
            Some((name, value)) if !name.is_empty() && !value.is_empty() => {
                bindings.insert(name.to_string(), parse_value(value));
            }
            _ => {
                return Err(LexError::new(
                    function_name!(),
                    format!("expected <name>=<value>, got {}", token),
                ))
            }
        }
    }
    Ok(bindings)
}

/// Literal of a value: number, "string", nil, true, or a symbol.
pub fn parse_value(token: &str) -> Value {
    if let Ok(i) = token.parse::<i64>() {
        return i.into();
    }
    if token.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = token.parse::<f64>() {
            return f.into();
        }
    }
    match token {
        NIL => Value::Nil,
        TRUE => Value::True,
        s if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') => {
            s[1..s.len() - 1].into()
        }
        s => Value::symbol(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexenv_structs::bindings;

    #[test]
    fn test_parse_let() {
        assert_eq!(
            Command::parse("let count=0 label=\"a b\"").unwrap(),
            Command::Let {
                bindings: bindings! {"count" => 0, "label" => "a b"},
                bound: false
            }
        );
        assert_eq!(
            Command::parse("let!").unwrap(),
            Command::Let {
                bindings: bindings! {},
                bound: true
            }
        );
        assert!(Command::parse("let count").is_err());
        let err = Command::parse("let a=1 a=2").unwrap_err();
        assert_eq!(err.get_message(), "a is bound twice");
    }

    #[test]
    fn test_parse_update() {
        assert_eq!(
            Command::parse("update count + 1").unwrap(),
            Command::Update("count".to_string(), Op::Add, 1.into())
        );
        assert!(Command::parse("update count / 2").is_err());
        assert!(Command::parse("update count + x").is_err());
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(Command::parse("   ").unwrap(), Command::Empty);
        assert_eq!(
            Command::parse("set x nil").unwrap(),
            Command::Set("x".to_string(), Value::Nil)
        );
        assert_eq!(Command::parse("quit").unwrap(), Command::Quit);
        assert!(Command::parse("get").is_err());
        assert!(Command::parse("set x \"open").is_err());
    }

    #[test]
    fn test_op_apply() {
        assert_eq!(
            Op::Mul.apply(Value::from(3), &Number::from(2.5)).unwrap(),
            Value::from(7.5)
        );
        assert_eq!(
            Op::Sub.apply(Value::from(3), &Number::from(5)).unwrap(),
            Value::from(-2)
        );
        assert!(Op::Add.apply(Value::from("a"), &Number::from(1)).is_err());
    }
}
