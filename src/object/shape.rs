use std::collections::BTreeSet;

/// Which protocol operation a member name answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Field,
    Method,
}

/// Registration-time declaration of a durable object's members.
///
/// Both the access router and the stub generator consume the same shape, so
/// field/method classification is decided once per type instead of being
/// rediscovered per request. Setter names (`set` + capitalized field) are
/// derived from it for the client-side convenience surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectShape {
    fields: BTreeSet<String>,
    methods: BTreeSet<String>,
}

impl ObjectShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into());
        self
    }

    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.methods.insert(name.into());
        self
    }

    pub fn classify(&self, name: &str) -> Option<Member> {
        if self.methods.contains(name) {
            Some(Member::Method)
        } else if self.fields.contains(name) {
            Some(Member::Field)
        } else {
            None
        }
    }

    pub fn is_method(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.methods.is_empty()
    }

    /// Synthesized setter name for a field: `counter` becomes `setCounter`.
    pub fn setter_name(field: &str) -> String {
        let mut chars = field.chars();
        match chars.next() {
            Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
            None => "set".to_string(),
        }
    }

    /// Resolves a synthesized setter name back to the field it writes.
    pub fn setter_target(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .map(String::as_str)
            .find(|field| Self::setter_name(field) == name)
    }

    /// Checks the declaration is usable by the router and stub generator.
    ///
    /// Rejects empty shapes, names declared as both field and method, reserved
    /// `__`-prefixed names, and members that collide with a synthesized setter.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.is_empty() {
            return Err("shape declares no fields or methods".to_string());
        }
        if let Some(name) = self.fields.intersection(&self.methods).next() {
            return Err(format!(
                "member '{name}' is declared as both a field and a method"
            ));
        }
        if let Some(name) = self
            .fields
            .iter()
            .chain(self.methods.iter())
            .find(|name| name.starts_with("__"))
        {
            return Err(format!("member '{name}' uses the reserved '__' prefix"));
        }
        for field in &self.fields {
            let setter = Self::setter_name(field);
            if self.fields.contains(&setter) || self.methods.contains(&setter) {
                return Err(format!(
                    "member '{setter}' collides with the synthesized setter for field '{field}'"
                ));
            }
        }
        Ok(())
    }
}
