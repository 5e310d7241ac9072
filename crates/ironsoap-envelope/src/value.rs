pub const FAULT_CODE: &str = "faultcode";
pub const FAULT_STRING: &str = "faultstring";

/// A named element of a decoded SOAP payload.
///
/// Leaf elements carry their text in `value`; elements with element children
/// carry them in `children` and leave `value` empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoapValue {
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
    pub children: Vec<SoapValue>,
}

impl SoapValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn child(&self, name: &str) -> Option<&SoapValue> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// The decoded SOAP body.
///
/// A fault message always has `faultcode` and `faultstring` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    name: String,
    namespace: Option<String>,
    fault: bool,
    arguments: Vec<SoapValue>,
}

impl Message {
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            ..Self::default()
        }
    }

    pub fn fault(code: impl Into<String>, description: impl Into<String>) -> Self {
        let mut message = Self::default();
        message.add_argument(FAULT_CODE, code);
        message.add_argument(FAULT_STRING, description);
        message.mark_fault();
        message
    }

    /// Flag the message as a fault, adding empty `faultcode`/`faultstring`
    /// arguments if they are not there yet.
    pub fn mark_fault(&mut self) {
        self.fault = true;
        for required in [FAULT_CODE, FAULT_STRING] {
            if self.argument(required).is_none() {
                self.add_argument(required, "");
            }
        }
    }

    pub fn is_fault(&self) -> bool {
        self.fault
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn add_argument(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.arguments.push(SoapValue::new(name, value));
    }

    pub fn push_argument(&mut self, value: SoapValue) {
        self.arguments.push(value);
    }

    pub fn arguments(&self) -> &[SoapValue] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&SoapValue> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    pub fn fault_code(&self) -> Option<&str> {
        self.fault
            .then(|| self.argument(FAULT_CODE))
            .flatten()
            .map(|arg| arg.value.as_str())
    }

    pub fn fault_string(&self) -> Option<&str> {
        self.fault
            .then(|| self.argument(FAULT_STRING))
            .flatten()
            .map(|arg| arg.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        !self.fault && self.name.is_empty() && self.arguments.is_empty()
    }
}

/// Decoded SOAP header entries, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<SoapValue>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: SoapValue) {
        self.0.push(header);
    }

    pub fn header(&self, name: &str) -> Option<&SoapValue> {
        self.0.iter().find(|h| h.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SoapValue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<SoapValue>> for Headers {
    fn from(headers: Vec<SoapValue>) -> Self {
        Self(headers)
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a SoapValue;
    type IntoIter = std::slice::Iter<'a, SoapValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
