//! Calculate 工具：四则运算
//!
//! 先过滤为 `0-9 + - * / . ( )` 与空格，再用递归下降求值（支持一元负号与括号）。

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::schema::{parse_args, schema_of, ExpressionArgs};
use crate::tools::Tool;

const ALLOWED_CHARS: &str = "0123456789+-*/.() ";
/// 一元符号与括号的最大嵌套层数
const MAX_NESTING: usize = 64;

pub struct CalculateTool;

#[async_trait]
impl Tool for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Perform mathematical calculations"
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<ExpressionArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let ExpressionArgs { expression } = parse_args(self.name(), args)?;
        let result = evaluate(&expression)?;
        Ok(serde_json::json!({
            "expression": expression,
            "result": result,
            "formatted": format!("{expression} = {result}"),
        }))
    }
}

/// 过滤非法字符后求值
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let clean: Vec<char> = expression
        .chars()
        .filter(|c| ALLOWED_CHARS.contains(*c) && !c.is_whitespace())
        .collect();
    if clean.is_empty() {
        return Err("Invalid mathematical expression".to_string());
    }
    let mut parser = Parser {
        chars: &clean,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos != clean.len() {
        return Err(format!("Calculation error: unexpected '{}'", clean[parser.pos]));
    }
    if !value.is_finite() {
        return Err("Calculation error: result is not finite".to_string());
    }
    Ok(value)
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// 消费一个一元符号或左括号后进入下一层
    fn nested(&mut self, inner: impl FnOnce(&mut Self) -> Result<f64, String>) -> Result<f64, String> {
        if self.depth >= MAX_NESTING {
            return Err("Calculation error: expression nested too deeply".to_string());
        }
        self.pos += 1;
        self.depth += 1;
        let value = inner(self);
        self.depth -= 1;
        value
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '/' {
                if rhs == 0.0 {
                    return Err("Calculation error: division by zero".to_string());
                }
                value /= rhs;
            } else {
                value *= rhs;
            }
        }
        Ok(value)
    }

    // factor := '-' factor | '+' factor | '(' expr ')' | number
    fn factor(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some('-') => self.nested(|p| Ok(-p.factor()?)),
            Some('+') => self.nested(Self::factor),
            Some('(') => self.nested(|p| {
                let value = p.expr()?;
                if p.peek() != Some(')') {
                    return Err("Calculation error: missing ')'".to_string());
                }
                p.pos += 1;
                Ok(value)
            }),
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(format!("Calculation error: unexpected '{c}'")),
            None => Err("Calculation error: unexpected end of expression".to_string()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| format!("Calculation error: invalid number '{literal}'"))
    }
}
