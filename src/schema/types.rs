//! Entity descriptors: what a generic repository needs to know about one table.

/// Semantic type of a writable field; decides JSON shape checks and bind types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Number,
    Boolean,
    /// RFC 3339 timestamp, stored as `TIMESTAMPTZ`.
    Timestamp,
    /// UUID: ids and foreign keys.
    Uuid,
}

impl FieldKind {
    pub fn describe(&self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Integer => "an integer",
            FieldKind::Number => "a number",
            FieldKind::Boolean => "a boolean",
            FieldKind::Timestamp => "an RFC 3339 timestamp",
            FieldKind::Uuid => "a UUID",
        }
    }
}

/// Value applied on create when the field is omitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldDefault {
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Text(&'static str),
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Must be present, non-null and non-blank on create.
    pub required: bool,
    /// May be supplied on update. Non-updatable fields are fixed at creation.
    pub updatable: bool,
    pub default: Option<FieldDefault>,
    /// Allowed text values; empty means unrestricted.
    pub allowed: &'static [&'static str],
    pub minimum: Option<f64>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec {
            name,
            kind,
            required: false,
            updatable: false,
            default: None,
            allowed: &[],
            minimum: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub const fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, FieldKind::Timestamp)
    }

    pub const fn uuid(name: &'static str) -> Self {
        Self::new(name, FieldKind::Uuid)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn updatable(mut self) -> Self {
        self.updatable = true;
        self
    }

    pub const fn default(mut self, value: FieldDefault) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = allowed;
        self
    }

    pub const fn at_least(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }
}

/// Optional list filter on a foreign key to the parent entity.
#[derive(Clone, Copy, Debug)]
pub struct ParentRef {
    /// Query-string parameter name (e.g. `category_id`).
    pub param: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

/// Rows in another table that reference this entity and block its deletion.
#[derive(Clone, Copy, Debug)]
pub struct Dependent {
    /// Plural label used in the refusal message (e.g. "stock variants").
    pub label: &'static str,
    pub table: &'static str,
    pub column: &'static str,
    /// Named COUNT query taking the entity id as `$1`.
    pub query: &'static str,
}

/// Names of the statements an entity needs in the query store.
#[derive(Clone, Copy, Debug)]
pub struct QueryNames {
    pub list: &'static str,
    pub count: &'static str,
    pub get: &'static str,
    pub create: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
}

#[derive(Debug)]
pub struct EntitySchema {
    /// Table name; also the entity's name in logs.
    pub name: &'static str,
    pub label: &'static str,
    pub label_plural: &'static str,
    pub path_segment: &'static str,
    /// Key holding the items array in list responses.
    pub collection_key: &'static str,
    pub id_column: &'static str,
    /// Writable fields, in the positional order the create statement expects.
    /// Updatable fields keep the same relative order after `$1 = id` in the update statement.
    pub fields: &'static [FieldSpec],
    pub parent: Option<ParentRef>,
    pub dependents: &'static [Dependent],
    /// Groups of optional fields where exactly one must be supplied on create.
    pub exactly_one_of: &'static [&'static [&'static str]],
    /// Number field pairs the create statement multiplies; the product must fit a double.
    pub products: &'static [(&'static str, &'static str)],
    pub queries: QueryNames,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn updatable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.updatable)
    }

    /// Every query name this entity resolves at runtime.
    pub fn query_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        let q = &self.queries;
        [q.list, q.count, q.get, q.create, q.update, q.delete]
            .into_iter()
            .chain(self.dependents.iter().map(|d| d.query))
    }
}
