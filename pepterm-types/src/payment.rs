//! Payment request parameters

/// Parameters for one payment attempt
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// Amount in major currency units, must be positive
    pub amount: f64,

    /// Caller-supplied opaque transaction identifier
    pub transaction_id: String,

    /// Operator code, up to four digits
    pub operator_code: Option<String>,

    /// Receipt description; anything past 42 characters is dropped
    pub description: Option<String>,
}

impl PaymentRequest {
    /// Request with just the required parameters
    pub fn new(amount: f64, transaction_id: impl Into<String>) -> Self {
        Self {
            amount,
            transaction_id: transaction_id.into(),
            operator_code: None,
            description: None,
        }
    }

    /// Set the operator code
    pub fn with_operator_code(mut self, code: impl Into<String>) -> Self {
        self.operator_code = Some(code.into());
        self
    }

    /// Set the receipt description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
