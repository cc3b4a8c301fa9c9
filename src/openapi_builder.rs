use crate::descriptor::TypeRef;
use crate::error::Result;
use crate::introspect::{Conflict, IntrospectionSession};
use crate::metadata::TypeMetadataProvider;
use crate::operations::{self as manifest, HttpMethod, OperationManifest, ParameterLocation};
use crate::schema::{ElementSchema, SchemaMeta, SchemaProperty, ValueConstraints};
use heck::ToSnakeCase;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const OPENAPI_VERSION: &str = "3.1.0";
pub const DEFAULT_TITLE: &str = "Generated API";
pub const DEFAULT_VERSION: &str = "1.0.0";

/// OpenAPI document builder
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    /// Paths collection (URL path -> PathItem)
    paths: IndexMap<String, PathItem>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Trace => &mut self.trace,
        }
    }
}

/// OpenAPI Operation object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: IndexMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query, header, cookie)
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    pub schema: Schema,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    /// Content types and their schemas
    pub content: IndexMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, Header>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<IndexMap<String, Value>>,
}

/// OpenAPI Header object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    pub schema: Schema,
}

/// OpenAPI Components object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub schemas: IndexMap<String, Schema>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub paths: IndexMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

/// `type` keyword: a single type, or a type array such as `["string", "null"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

/// JSON Schema object as used by OpenAPI 3.1
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

impl Schema {
    fn typed(name: &str) -> Self {
        Self {
            schema_type: Some(SchemaType::Single(name.to_string())),
            ..Default::default()
        }
    }

    fn reference_to(name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{}", name)),
            ..Default::default()
        }
    }

    /// Converts an engine schema node into its document form
    pub fn from_element(element: &ElementSchema) -> Self {
        let mut schema = match element {
            ElementSchema::Primitive(primitive) => {
                let mut schema = Self::typed(primitive.scalar.as_str());
                schema.format = primitive.format.clone();
                schema.apply_constraints(&primitive.constraints);
                schema
            }
            ElementSchema::Enum(enumeration) => {
                let mut schema = Self::typed("string");
                schema.enum_values = Some(
                    enumeration
                        .values
                        .iter()
                        .map(|value| Value::String(value.clone()))
                        .collect(),
                );
                schema
            }
            ElementSchema::Array(array) => {
                let mut schema = Self::typed("array");
                let mut items = Self::from_element(&array.items);
                if array.items_nullable {
                    items = items.into_nullable();
                }
                schema.items = Some(Box::new(items));
                schema.min_items = array.constraints.min_items;
                schema.max_items = array.constraints.max_items;
                schema.unique_items = array.constraints.unique_items.then_some(true);
                schema
            }
            ElementSchema::AdditionalProperties(map) => {
                let mut schema = Self::typed("object");
                let mut values = Self::from_element(&map.values);
                if map.values_nullable {
                    values = values.into_nullable();
                }
                schema.additional_properties = Some(Box::new(values));
                schema
            }
            ElementSchema::Object(object) => {
                let mut schema = Self::typed("object");
                let properties: IndexMap<String, Schema> = object
                    .properties
                    .iter()
                    .filter(|(_, property)| !property.transient)
                    .map(|(name, property)| (name.clone(), Self::from_property(property)))
                    .collect();
                if !properties.is_empty() {
                    schema.properties = Some(properties);
                }
                let required: Vec<String> =
                    object.required().into_iter().map(str::to_string).collect();
                if !required.is_empty() {
                    schema.required = Some(required);
                }
                schema
            }
            ElementSchema::Reference(reference) => Self::reference_to(&reference.name),
        };
        if let Some(meta) = element.meta() {
            schema.apply_meta(meta);
        }
        schema
    }

    /// Property schema with nullability folded in
    pub fn from_property(property: &SchemaProperty) -> Self {
        let mut schema = Self::from_element(&property.schema);
        if property.nullable {
            schema = schema.into_nullable();
        }
        if property.description.is_some() {
            schema.description = property.description.clone();
        }
        schema
    }

    /// Admits `null`: typed schemas get a type array, anything else is wrapped in `anyOf`
    pub fn into_nullable(mut self) -> Self {
        match self.schema_type.take() {
            Some(SchemaType::Single(name)) if self.reference.is_none() => {
                self.schema_type = Some(SchemaType::Multiple(vec![name, "null".to_string()]));
                if let Some(values) = self.enum_values.as_mut() {
                    values.push(Value::Null);
                }
                self
            }
            Some(SchemaType::Multiple(mut names)) => {
                if !names.iter().any(|name| name == "null") {
                    names.push("null".to_string());
                }
                self.schema_type = Some(SchemaType::Multiple(names));
                self
            }
            schema_type => {
                self.schema_type = schema_type;
                let description = self.description.take();
                Self {
                    any_of: Some(vec![self, Self::typed("null")]),
                    description,
                    ..Default::default()
                }
            }
        }
    }

    fn apply_constraints(&mut self, constraints: &ValueConstraints) {
        self.min_length = constraints.min_length;
        self.max_length = constraints.max_length;
        self.pattern = constraints.pattern.clone();
        self.minimum = constraints.minimum.and_then(number);
        self.maximum = constraints.maximum.and_then(number);
        self.multiple_of = constraints.multiple_of.and_then(number);
    }

    fn apply_meta(&mut self, meta: &SchemaMeta) {
        if meta.description.is_some() {
            self.description = meta.description.clone();
        }
        if meta.default.is_some() {
            self.default = meta.default.clone();
        }
        if !meta.examples.is_empty() {
            self.examples = Some(meta.examples.clone());
        }
        if meta.deprecated {
            self.deprecated = Some(true);
        }
    }
}

/// Integral values render without a fractional part
fn number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Some(Number::from(value as i64))
    } else {
        Number::from_f64(value)
    }
}

/// A composed document plus the naming conflicts found while composing it
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub document: OpenApiDocument,
    pub conflicts: Vec<Conflict>,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info {
                title: DEFAULT_TITLE.to_string(),
                version: DEFAULT_VERSION.to_string(),
                description: None,
            },
            paths: IndexMap::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    /// Adds one manifest operation, resolving its types through `session`
    ///
    /// # Errors
    ///
    /// Returns an error if one of the operation's type expressions does not parse.
    pub fn add_operation(
        &mut self,
        operation: &manifest::Operation,
        session: &mut IntrospectionSession<'_>,
    ) -> Result<()> {
        debug!("Adding operation: {} {}", operation.method, operation.path);

        let openapi_path = Self::convert_path_format(&operation.path);

        let mut parameters = Vec::with_capacity(operation.parameters.len());
        for parameter in &operation.parameters {
            parameters.push(Self::parameter(parameter, session)?);
        }

        let request_body = match &operation.request_body {
            Some(body) => {
                let ty = TypeRef::parse(&body.type_expr)?;
                let schema = Schema::from_element(&session.resolve(&ty));
                Some(RequestBody {
                    description: body.description.clone(),
                    required: body.required,
                    content: IndexMap::from([(body.content_type.clone(), MediaType { schema })]),
                })
            }
            None => None,
        };

        let mut responses = IndexMap::new();
        for response in &operation.responses {
            responses.insert(response.status.to_string(), Self::response(response, session)?);
        }
        if responses.is_empty() {
            responses.insert(
                "200".to_string(),
                Response {
                    description: "Successful response".to_string(),
                    headers: None,
                    content: None,
                    links: None,
                },
            );
        }

        let operation_id = operation.operation_id.clone().unwrap_or_else(|| {
            format!("{} {}", operation.method, operation.path).to_snake_case()
        });
        let entry = Operation {
            tags: operation.tags.clone(),
            summary: Some(
                operation
                    .summary
                    .clone()
                    .unwrap_or_else(|| format!("{} {}", operation.method, operation.path)),
            ),
            description: operation.description.clone(),
            operation_id: Some(operation_id),
            parameters: (!parameters.is_empty()).then_some(parameters),
            request_body,
            responses,
            deprecated: operation.deprecated.then_some(true),
        };

        let slot = self.paths.entry(openapi_path).or_default().slot(operation.method);
        if slot.is_some() {
            warn!(
                "Operation {} {} is declared more than once; keeping the last one",
                operation.method, operation.path
            );
        }
        *slot = Some(entry);
        Ok(())
    }

    fn parameter(
        parameter: &manifest::Parameter,
        session: &mut IntrospectionSession<'_>,
    ) -> Result<Parameter> {
        let ty = TypeRef::parse(&parameter.type_expr)?;
        let required = match parameter.location {
            ParameterLocation::Path => true,
            _ => parameter.required.unwrap_or(!ty.nullable),
        };
        let mut schema = Schema::from_element(&session.resolve(&ty));
        if parameter.default.is_some() {
            schema.default = parameter.default.clone();
        }
        Ok(Parameter {
            name: parameter.name.clone(),
            location: parameter.location.as_str().to_string(),
            required,
            description: parameter.description.clone(),
            deprecated: parameter.deprecated.then_some(true),
            style: parameter.style.clone(),
            explode: parameter.explode,
            schema,
        })
    }

    fn response(
        response: &manifest::Response,
        session: &mut IntrospectionSession<'_>,
    ) -> Result<Response> {
        let content = match &response.type_expr {
            Some(expr) => {
                let ty = TypeRef::parse(expr)?;
                let mut schema = Schema::from_element(&session.resolve(&ty));
                if ty.nullable {
                    schema = schema.into_nullable();
                }
                Some(IndexMap::from([(response.content_type.clone(), MediaType { schema })]))
            }
            None => None,
        };

        let mut headers = IndexMap::new();
        for header in &response.headers {
            let ty = TypeRef::parse(&header.type_expr)?;
            headers.insert(
                header.name.clone(),
                Header {
                    description: header.description.clone(),
                    required: header.required,
                    schema: Schema::from_element(&session.resolve(&ty)),
                },
            );
        }

        Ok(Response {
            description: response
                .description
                .clone()
                .unwrap_or_else(|| response.status.default_description().to_string()),
            headers: (!headers.is_empty()).then_some(headers),
            content,
            links: (!response.links.is_empty()).then(|| response.links.clone()),
        })
    }

    /// Convert path format from :param or {param} to OpenAPI {param} format
    fn convert_path_format(path: &str) -> String {
        manifest::normalize_path(path)
    }

    /// Build the final OpenAPI document from the session's registry
    pub fn build(self, session: IntrospectionSession<'_>) -> GeneratedDocument {
        debug!("Building final OpenAPI document");

        let output = session.into_output();
        for conflict in &output.conflicts {
            warn!("{}; keeping the first definition", conflict);
        }

        let mut schemas = IndexMap::new();
        for entry in output.registry.iter() {
            if schemas.contains_key(&entry.name) {
                continue;
            }
            schemas.insert(entry.name.clone(), Schema::from_element(&entry.schema));
        }
        let components = (!schemas.is_empty()).then_some(Components { schemas });

        GeneratedDocument {
            document: OpenApiDocument {
                openapi: OPENAPI_VERSION.to_string(),
                info: self.info,
                paths: self.paths,
                components,
            },
            conflicts: output.conflicts,
        }
    }

    /// Composes every operation of `manifest` in one introspection pass
    ///
    /// # Errors
    ///
    /// Returns an error if a type expression in the manifest does not parse.
    pub fn generate(
        mut self,
        manifest: &OperationManifest,
        provider: &dyn TypeMetadataProvider,
    ) -> Result<GeneratedDocument> {
        let mut session = IntrospectionSession::new(provider);
        for operation in &manifest.operations {
            self.add_operation(operation, &mut session)?;
        }
        Ok(self.build(session))
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}
