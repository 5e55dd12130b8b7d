//! Calculate 动作：安全的四则运算求值
//!
//! 支持 `+ - * / // % **`、括号、一元正负号与小数；不执行任何代码。
//! `**` 右结合且优先级高于一元负号（`-2**2 == -4`）。

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::Action;

pub struct CalculateTool;

#[async_trait]
impl Action for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Params: {\"expression\": \"(1 + 2) * 3\"}"
    }

    async fn execute(&self, params: Value) -> Result<String, String> {
        let expression = params
            .get("expression")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        tracing::debug!(expression = %expression, "calculate action");
        Ok(match evaluate(expression) {
            Ok(value) => format!("Result: {}", format_number(value)),
            Err(e) => format!("Could not calculate expression: {}", e),
        })
    }
}

/// 整数结果不带小数点
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Pow,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let num = literal
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{}'", literal))?;
                tokens.push(Token::Num(num));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }
    Ok(tokens)
}

/// 一元运算与括号的最大嵌套层数，超过则报错而不是继续递归
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn descend(&mut self) -> Result<(), String> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err("expression nested too deeply".to_string());
        }
        Ok(())
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(tok @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if tok == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := unary (('*' | '/' | '//' | '%') unary)*
    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.unary()?;
        while let Some(tok @ (Token::Star | Token::Slash | Token::DoubleSlash | Token::Percent)) =
            self.peek()
        {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match tok {
                Token::Star => value * rhs,
                _ if rhs == 0.0 => return Err("division by zero".to_string()),
                Token::Slash => value / rhs,
                Token::DoubleSlash => (value / rhs).floor(),
                // 与除数同号的取模
                _ => value - rhs * (value / rhs).floor(),
            };
        }
        Ok(value)
    }

    // unary := ('+' | '-') unary | power
    fn unary(&mut self) -> Result<f64, String> {
        self.descend()?;
        let value = match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                -self.unary()?
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()?
            }
            _ => self.power()?,
        };
        self.depth -= 1;
        Ok(value)
    }

    // power := primary ('**' unary)?
    fn power(&mut self) -> Result<f64, String> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, String> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                self.descend()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(tok) => Err(format!("unexpected token {:?}", tok)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

/// 对表达式求值
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(format!("unexpected token {:?}", parser.tokens[parser.pos]));
    }
    if !value.is_finite() {
        return Err("result is not a finite number".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_precedence_and_parens() {
        assert_eq!(evaluate("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(evaluate("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(evaluate("2 ** 3 ** 2").unwrap(), 512.0);
        assert_eq!(evaluate("-2 ** 2").unwrap(), -4.0);
        assert_eq!(evaluate("7 // 2").unwrap(), 3.0);
        assert_eq!(evaluate("-7 % 3").unwrap(), 2.0);
        assert_eq!(evaluate("7 / 2").unwrap(), 3.5);
    }

    #[test]
    fn test_errors() {
        assert!(evaluate("").is_err());
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 + ").is_err());
        assert!(evaluate("import os").is_err());
        assert!(evaluate("1 2").is_err());
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            evaluate(&parens),
            Err("expression nested too deeply".to_string())
        );

        let minus = format!("{}1", "-".repeat(20_000));
        assert_eq!(
            evaluate(&minus),
            Err("expression nested too deeply".to_string())
        );

        let powers = format!("1{}", " ** 1".repeat(5_000));
        assert!(evaluate(&powers).is_err());

        let shallow = format!("{}2{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&shallow).unwrap(), 2.0);
        assert_eq!(evaluate("--1").unwrap(), 1.0);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(-4.0), "-4");
    }

    #[tokio::test]
    async fn test_action_output() {
        let ok = CalculateTool
            .execute(json!({"expression": "12 * (3 + 4)"}))
            .await
            .unwrap();
        assert_eq!(ok, "Result: 84");

        let err = CalculateTool
            .execute(json!({"expression": "2 +"}))
            .await
            .unwrap();
        assert!(err.starts_with("Could not calculate expression:"));

        let nested = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        let deep = CalculateTool
            .execute(json!({ "expression": nested }))
            .await
            .unwrap();
        assert_eq!(
            deep,
            "Could not calculate expression: expression nested too deeply"
        );
    }
}
