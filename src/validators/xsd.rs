use crate::error::{Issue, Report, ValidatorError};
use crate::schema::{self, SchemaRepository, XmlSchema};
use crate::xml::{self, XmlDocument};
use std::sync::Arc;

/// Checks a well-formed XML document against an [`XmlSchema`].
///
/// Every grammar violation becomes one error carrying the line/column of the
/// offending element. Malformed markup (only detectable by the byte entry
/// points) becomes a single `"parse-error"` and no grammar check runs.
#[derive(Clone, Debug)]
pub struct XsdValidator {
    schema: Arc<XmlSchema>,
    category: String,
}

impl XsdValidator {
    pub fn new(schema: Arc<XmlSchema>) -> Self {
        XsdValidator {
            schema,
            category: "xsd".to_string(),
        }
    }

    /// Report violations under `category` instead of `"xsd"`.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn schema(&self) -> &XmlSchema {
        &self.schema
    }

    pub fn validate(&self, document: &XmlDocument) -> Report {
        let report: Report = self
            .schema
            .validate(document)
            .into_iter()
            .map(|v| Issue::error(self.category.as_str(), v.message).at(v.line, v.column))
            .collect();
        tracing::debug!(
            validator = "xsd",
            schema = %self.schema.name,
            errors = report.len(),
            "validated document"
        );
        report
    }

    pub fn validate_bytes(&self, bytes: &[u8]) -> Report {
        match xml::parse_bytes(bytes) {
            Ok(doc) => self.validate(&doc),
            Err(e) => Report::single(e.into_issue()),
        }
    }

    pub fn validate_str(&self, input: &str) -> Report {
        self.validate_bytes(input.as_bytes())
    }
}

/// [`XsdValidator`] fixed to the METS grammar; category `"xsd:mets"`.
#[derive(Clone, Debug)]
pub struct XsdMetsValidator {
    inner: XsdValidator,
}

impl XsdMetsValidator {
    pub fn new(repo: &SchemaRepository) -> Result<Self, ValidatorError> {
        Ok(XsdMetsValidator {
            inner: XsdValidator::new(repo.xml_schema(schema::METS)?).with_category("xsd:mets"),
        })
    }

    pub fn builtin() -> Result<Self, ValidatorError> {
        let repo = SchemaRepository::builtin()?;
        Self::new(&repo)
    }

    pub fn validate(&self, document: &XmlDocument) -> Report {
        self.inner.validate(document)
    }

    pub fn validate_bytes(&self, bytes: &[u8]) -> Report {
        self.inner.validate_bytes(bytes)
    }
}

/// [`XsdValidator`] fixed to the PAGE grammar; category `"xsd:page"`.
///
/// Accepts the 2013, 2016, 2017, 2018 and 2019 PAGE namespaces.
#[derive(Clone, Debug)]
pub struct XsdPageValidator {
    inner: XsdValidator,
}

impl XsdPageValidator {
    pub fn new(repo: &SchemaRepository) -> Result<Self, ValidatorError> {
        Ok(XsdPageValidator {
            inner: XsdValidator::new(repo.xml_schema(schema::PAGE)?).with_category("xsd:page"),
        })
    }

    pub fn builtin() -> Result<Self, ValidatorError> {
        let repo = SchemaRepository::builtin()?;
        Self::new(&repo)
    }

    pub fn validate(&self, document: &XmlDocument) -> Report {
        self.inner.validate(document)
    }

    pub fn validate_bytes(&self, bytes: &[u8]) -> Report {
        self.inner.validate_bytes(bytes)
    }
}
