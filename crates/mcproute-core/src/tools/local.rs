//! In-process arithmetic tools
//!
//! Same validation path as remote tools, no endpoint involved.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::action::ToolHandler;
use super::error::{ActionResult, ToolError};
use super::schema::{ParamKind, ParamSpec, ToolMetadata, ToolSchema};

/// Instruction used by the agent when running with local tools only
pub const LOCAL_MATH_INSTRUCTION: &str = "You are a helpful mathematical assistant. \
IMPORTANT: You must perform calculations STEP-BY-STEP. \
Wait for the result of one tool call before starting the next.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Operation::Add => "Add two numbers together.",
            Operation::Subtract => "Subtract b from a.",
            Operation::Multiply => "Multiply two numbers.",
            Operation::Divide => "Divide a by b.",
        }
    }

    fn apply(&self, a: f64, b: f64) -> Option<f64> {
        match self {
            Operation::Add => Some(a + b),
            Operation::Subtract => Some(a - b),
            Operation::Multiply => Some(a * b),
            Operation::Divide if b == 0.0 => None,
            Operation::Divide => Some(a / b),
        }
    }
}

/// One arithmetic tool over two numbers `a` and `b`
pub struct LocalTool {
    operation: Operation,
    metadata: ToolMetadata,
}

impl LocalTool {
    pub fn new(operation: Operation) -> Self {
        let schema = ToolSchema::new(vec![
            ParamSpec::required("a", ParamKind::Number).with_description("First operand"),
            ParamSpec::required("b", ParamKind::Number).with_description("Second operand"),
        ]);
        Self {
            operation,
            metadata: ToolMetadata::new(operation.name(), operation.description(), schema),
        }
    }

    /// add, subtract, multiply and divide
    pub fn all() -> Vec<Arc<dyn ToolHandler>> {
        Operation::ALL
            .iter()
            .map(|op| Arc::new(Self::new(*op)) as Arc<dyn ToolHandler>)
            .collect()
    }
}

#[async_trait]
impl ToolHandler for LocalTool {
    fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    async fn call(&self, arguments: &Value) -> ActionResult<String> {
        let name = self.operation.name();
        let validated = self.metadata.schema.validate(name, arguments)?;
        let operand = |key: &str| validated.get(key).and_then(Value::as_f64).unwrap_or_default();

        self.operation
            .apply(operand("a"), operand("b"))
            .map(|value| format!("{:?}", value))
            .ok_or_else(|| ToolError::execution(name, "Cannot divide by zero"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_operations() {
        let cases = [
            (Operation::Add, 2.0, 3.0, "5.0"),
            (Operation::Subtract, 10.0, 4.5, "5.5"),
            (Operation::Multiply, 6.0, 7.0, "42.0"),
            (Operation::Divide, 10.0, 4.0, "2.5"),
        ];
        for (op, a, b, expected) in cases {
            let result = LocalTool::new(op).call(&json!({"a": a, "b": b})).await.unwrap();
            assert_eq!(result, expected, "{}", op.name());
        }
    }

    #[tokio::test]
    async fn test_divide_by_zero() {
        let result = LocalTool::new(Operation::Divide)
            .call(&json!({"a": 1, "b": 0}))
            .await;
        match result {
            Err(ToolError::Execution { tool, message }) => {
                assert_eq!(tool, "divide");
                assert_eq!(message, "Cannot divide by zero");
            }
            other => panic!("expected Execution error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_both_operands_required() {
        let result = LocalTool::new(Operation::Add).call(&json!({"a": 1})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments { .. })));
    }

    #[test]
    fn test_all_declares_four_tools() {
        let names: Vec<String> = LocalTool::all().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["add", "subtract", "multiply", "divide"]);

        let declared = LocalTool::new(Operation::Add).metadata().to_tool();
        assert_eq!(declared.input_schema.unwrap()["required"], json!(["a", "b"]));
    }
}
