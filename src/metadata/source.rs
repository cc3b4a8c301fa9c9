//! Builds a [`TypeCatalog`] from parsed Rust source.
//!
//! Collection runs in two passes. The first pass walks every file (and inline `mod` block)
//! to record declared structs and enums, `use` imports per module and `impl Default`
//! targets. The second pass turns each declaration into a [`TypeDef`], qualifying every
//! field type against the declarations found in the first pass.

use super::attributes::{self, SerdeContainer};
use super::catalog::TypeCatalog;
use super::model::{
    ConstructorParam, FieldOptionality, PropertyDef, RenameSource, SerializerDescriptor, TypeDef,
};
use super::{ContainerKind, PrimitiveKind, FREE_FORM_TYPES};
use crate::descriptor::{simple_name, TypeRef, ARRAY_CLASSIFIER, UNSUPPORTED_CLASSIFIER};
use crate::error::{Error, Result};
use crate::parser::ParsedFile;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use syn::{Attribute, Fields, Item, ItemEnum, ItemStruct, UseTree, Visibility};

/// Builds type metadata from parsed Rust files.
pub struct SourceCatalog;

enum Declaration<'a> {
    Struct(&'a ItemStruct),
    Enum(&'a ItemEnum),
}

struct Declared<'a> {
    module: String,
    qualified_name: String,
    item: Declaration<'a>,
}

/// Imports visible in one module
#[derive(Debug, Default)]
struct Scope {
    /// Imported name -> absolute path segments
    imports: HashMap<String, Vec<String>>,
    /// Absolute paths of glob imports
    globs: Vec<Vec<String>>,
}

#[derive(Default)]
struct Collector<'a> {
    declarations: Vec<Declared<'a>>,
    scopes: HashMap<String, Scope>,
    /// `(module, self type)` of every `impl Default`
    default_impls: Vec<(String, String)>,
}

/// Name resolution against the declarations of the whole project
struct Resolver {
    declared: HashSet<String>,
    scopes: HashMap<String, Scope>,
}

impl SourceCatalog {
    /// Builds a catalog from parsed files.
    ///
    /// Duplicate declarations are logged and skipped; the first one wins.
    ///
    /// # Errors
    ///
    /// Returns an error when a declaration carries invalid constraints (e.g. `min_length`
    /// greater than `max_length`).
    pub fn build(files: &[ParsedFile]) -> Result<TypeCatalog> {
        let mut collector = Collector::default();
        for file in files {
            collector.collect_items(&file.module_path, &file.syntax_tree.items);
        }
        debug!(
            "Collected {} type declarations from {} files",
            collector.declarations.len(),
            files.len()
        );

        let resolver = Resolver {
            declared: collector
                .declarations
                .iter()
                .map(|d| d.qualified_name.clone())
                .collect(),
            scopes: collector.scopes,
        };

        let defaulted: HashSet<String> = collector
            .default_impls
            .iter()
            .map(|(module, classifier)| resolver.qualify(module, classifier, &[]))
            .collect();

        let mut catalog = TypeCatalog::new();
        for declared in &collector.declarations {
            let def = match declared.item {
                Declaration::Struct(item) => {
                    match build_struct(&resolver, declared, item, &defaulted) {
                        Some(def) => def,
                        None => continue,
                    }
                }
                Declaration::Enum(item) => build_enum(declared, item),
            };

            match catalog.register(def) {
                Ok(()) => {}
                Err(Error::DuplicateType(name)) => {
                    warn!("Type {} is declared more than once; keeping the first", name);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(catalog)
    }
}

impl<'a> Collector<'a> {
    fn collect_items(&mut self, module: &str, items: &'a [Item]) {
        for item in items {
            match item {
                Item::Struct(item) if !is_test_only(&item.attrs) => {
                    self.declare(module, &item.ident, Declaration::Struct(item));
                }
                Item::Enum(item) if !is_test_only(&item.attrs) => {
                    self.declare(module, &item.ident, Declaration::Enum(item));
                }
                Item::Mod(item) if !is_test_only(&item.attrs) => {
                    if let Some((_, content)) = &item.content {
                        let nested = format!("{}::{}", module, item.ident);
                        self.collect_items(&nested, content);
                    }
                }
                Item::Use(item) => {
                    let scope = self.scopes.entry(module.to_string()).or_default();
                    collect_use(&item.tree, &mut Vec::new(), module, scope);
                }
                Item::Impl(item) => {
                    let is_default = item
                        .trait_
                        .as_ref()
                        .and_then(|(_, path, _)| path.segments.last())
                        .is_some_and(|segment| segment.ident == "Default");
                    if is_default {
                        let target = TypeRef::from_syn(&item.self_ty);
                        self.default_impls.push((module.to_string(), target.classifier));
                    }
                }
                _ => {}
            }
        }
    }

    fn declare(&mut self, module: &str, ident: &syn::Ident, item: Declaration<'a>) {
        self.declarations.push(Declared {
            module: module.to_string(),
            qualified_name: format!("{}::{}", module, ident),
            item,
        });
    }
}

fn collect_use(tree: &UseTree, prefix: &mut Vec<String>, module: &str, scope: &mut Scope) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_use(&path.tree, prefix, module, scope);
            prefix.pop();
        }
        UseTree::Name(name) => {
            let ident = name.ident.to_string();
            if ident == "self" {
                if let Some(last) = prefix.last() {
                    scope.imports.insert(last.clone(), absolutize(module, prefix));
                }
            } else {
                let mut path = prefix.clone();
                path.push(ident.clone());
                scope.imports.insert(ident, absolutize(module, &path));
            }
        }
        UseTree::Rename(rename) => {
            let alias = rename.rename.to_string();
            if alias == "_" {
                return;
            }
            let mut path = prefix.clone();
            if rename.ident != "self" {
                path.push(rename.ident.to_string());
            }
            scope.imports.insert(alias, absolutize(module, &path));
        }
        UseTree::Glob(_) => scope.globs.push(absolutize(module, prefix)),
        UseTree::Group(group) => {
            for tree in &group.items {
                collect_use(tree, prefix, module, scope);
            }
        }
    }
}

/// Resolves a leading `crate`, `self` or `super` against `module`
fn absolutize(module: &str, segments: &[String]) -> Vec<String> {
    let mut base: Vec<String> = module.split("::").map(str::to_string).collect();
    match segments.first().map(String::as_str) {
        Some("crate") => {
            base.truncate(1);
            base.extend(segments[1..].iter().cloned());
            base
        }
        Some("self") => {
            base.extend(segments[1..].iter().cloned());
            base
        }
        Some("super") => {
            let supers = segments.iter().take_while(|s| *s == "super").count();
            let keep = base.len().saturating_sub(supers).max(1);
            base.truncate(keep);
            base.extend(segments[supers..].iter().cloned());
            base
        }
        _ => segments.to_vec(),
    }
}

/// `#[cfg(test)]` items are not part of the application's types
fn is_test_only(attrs: &[Attribute]) -> bool {
    attrs.iter().filter(|a| a.path().is_ident("cfg")).any(|attr| {
        let mut test = false;
        // `cfg(all(test, ..))` and friends are treated as test-only too
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("test") {
                test = true;
            } else if meta.input.peek(syn::token::Paren) {
                meta.parse_nested_meta(|inner| {
                    if inner.path.is_ident("test") {
                        test = true;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        });
        test
    })
}

impl Resolver {
    /// Qualifies a classifier as seen from `module`. Type parameters, well-known types and
    /// names that match no declaration are returned unchanged.
    fn qualify(&self, module: &str, classifier: &str, type_params: &[String]) -> String {
        if classifier == ARRAY_CLASSIFIER || classifier == UNSUPPORTED_CLASSIFIER {
            return classifier.to_string();
        }
        let trimmed = classifier.trim_start_matches("::");
        let segments: Vec<String> = trimmed.split("::").map(str::to_string).collect();
        if segments.len() == 1 && type_params.contains(&segments[0]) {
            return classifier.to_string();
        }

        let scope = self.scopes.get(module);
        let mut candidates = Vec::new();
        match segments[0].as_str() {
            "crate" | "self" | "super" => candidates.push(absolutize(module, &segments).join("::")),
            first => {
                if let Some(target) = scope.and_then(|s| s.imports.get(first)) {
                    let mut expanded = target.clone();
                    expanded.extend(segments[1..].iter().cloned());
                    let expanded = expanded.join("::");
                    candidates.push(format!("{}::{}", module, expanded));
                    candidates.push(expanded);
                }
                candidates.push(format!("{}::{}", module, trimmed));
                if let Some(scope) = scope {
                    for glob in &scope.globs {
                        candidates.push(format!("{}::{}", glob.join("::"), trimmed));
                    }
                }
                candidates.push(trimmed.to_string());
            }
        }

        for candidate in &candidates {
            if self.declared.contains(candidate) {
                return candidate.clone();
            }
            if let Some(reexported) = self.follow_reexport(candidate) {
                return reexported;
            }
        }

        if !is_well_known(trimmed) {
            let suffix = format!("::{}", trimmed);
            let mut matches = self.declared.iter().filter(|d| d.ends_with(&suffix));
            if let (Some(found), None) = (matches.next(), matches.next()) {
                return found.clone();
            }
        }

        classifier.to_string()
    }

    /// `crate::User` where the crate root does `pub use models::User;`
    fn follow_reexport(&self, path: &str) -> Option<String> {
        let (module, name) = path.rsplit_once("::")?;
        let target = self.scopes.get(module)?.imports.get(name)?.join("::");
        if self.declared.contains(&target) {
            return Some(target);
        }
        let relative = format!("{}::{}", module, target);
        self.declared.contains(&relative).then_some(relative)
    }

    fn qualify_type(&self, module: &str, ty: &mut TypeRef, type_params: &[String]) {
        ty.for_each_classifier_mut(&mut |classifier| {
            let qualified = self.qualify(module, classifier, type_params);
            if *classifier != qualified {
                *classifier = qualified;
            }
        });
    }
}

fn is_well_known(classifier: &str) -> bool {
    PrimitiveKind::from_classifier(classifier).is_some()
        || ContainerKind::from_classifier(classifier).is_some()
        || FREE_FORM_TYPES.contains(&simple_name(classifier))
}

fn is_serde_derived(derived: &HashSet<String>) -> bool {
    derived.contains("Serialize") || derived.contains("Deserialize")
}

fn container_rename(container: &SerdeContainer, schema_rename: Option<String>) -> Option<String> {
    container.rename.clone().or(schema_rename)
}

fn build_struct(
    resolver: &Resolver,
    declared: &Declared,
    item: &ItemStruct,
    defaulted: &HashSet<String>,
) -> Option<TypeDef> {
    let qualified = &declared.qualified_name;
    let fields = match &item.fields {
        Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            warn!("Tuple struct {} is not supported; skipping", qualified);
            return None;
        }
    };

    let derived = attributes::derives(&item.attrs);
    let serde_derived = is_serde_derived(&derived);
    let has_default = derived.contains("Default") || defaulted.contains(qualified);
    let container = attributes::serde_container(&item.attrs);
    let schema = attributes::schema_attrs(&item.attrs, qualified);
    let type_params: Vec<String> = item
        .generics
        .type_params()
        .map(|param| param.ident.to_string())
        .collect();

    let mut def = TypeDef::object(qualified.clone())
        .type_params(type_params.clone())
        .with_attributes(schema.attributes);
    def.rename = container_rename(&container, schema.rename);

    let mut serializer = SerializerDescriptor::default();
    let mut constructor = Vec::new();

    for field in fields {
        let Some(ident) = &field.ident else { continue };
        let name = ident.to_string();
        let target = format!("{}.{}", qualified, name);
        let serde = attributes::serde_field(&field.attrs);
        let field_schema = attributes::schema_attrs(&field.attrs, &target);

        let mut ty = TypeRef::from_syn(&field.ty);
        resolver.qualify_type(&declared.module, &mut ty, &type_params);

        if serde.flatten {
            debug!("{} flattens {}; treating it as a supertype", qualified, ty);
            ty.nullable = false;
            def = def.extends(ty);
            continue;
        }

        if serde_derived {
            let optionality = match &serde.error {
                Some(message) => FieldOptionality::Malformed(message.clone()),
                None if serde.default || container.default || ty.nullable => {
                    FieldOptionality::Optional
                }
                None => FieldOptionality::Required,
            };
            serializer.fields.insert(name.clone(), optionality);
        } else if let Some(message) = &serde.error {
            warn!("Malformed serde attribute on {}: {}", target, message);
        }

        let mut property = PropertyDef::new(name.clone(), ty).with_attributes(field_schema.attributes);
        property.public = serde_derived || !matches!(field.vis, Visibility::Inherited);
        property.required = field_schema.required;
        property.ignored = serde.skip || field_schema.ignore;

        let serializer_rename = serde.rename.clone().or_else(|| {
            let rule = container.rename_all.as_deref()?;
            let renamed = attributes::apply_rename_rule(rule, &name);
            if renamed.is_none() {
                warn!("Unknown rename_all rule `{}` on {}", rule, qualified);
            }
            renamed.filter(|renamed| *renamed != name)
        });
        if let Some(rename) = serializer_rename {
            property = property.renamed_by(RenameSource::Serializer, rename);
        }
        if let Some(rename) = field_schema.rename {
            property = property.renamed_by(RenameSource::Metadata, rename);
        }

        constructor.push(ConstructorParam {
            name,
            has_default,
        });
        def = def.property(property);
    }

    if serde_derived {
        def = def.with_serializer(serializer);
    }
    Some(def.with_constructor(constructor))
}

fn build_enum(declared: &Declared, item: &ItemEnum) -> TypeDef {
    let qualified = &declared.qualified_name;
    let container = attributes::serde_container(&item.attrs);
    let schema = attributes::schema_attrs(&item.attrs, qualified);

    let mut variants = Vec::new();
    for variant in &item.variants {
        if !matches!(variant.fields, Fields::Unit) {
            warn!(
                "Variant {}::{} carries data and is left out of the enum schema",
                qualified, variant.ident
            );
            continue;
        }
        let serde = attributes::serde_field(&variant.attrs);
        if serde.skip {
            continue;
        }
        let name = variant.ident.to_string();
        let name = serde
            .rename
            .or_else(|| {
                container
                    .rename_all
                    .as_deref()
                    .and_then(|rule| attributes::apply_rename_rule(rule, &name))
            })
            .unwrap_or(name);
        variants.push(name);
    }

    let mut def = TypeDef::enumeration(qualified.clone(), variants).with_attributes(schema.attributes);
    def.rename = container_rename(&container, schema.rename);
    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetadataDescriptor, TypeDefKind, TypeMetadataProvider};
    use crate::parser::AstParser;

    fn build(sources: &[(&str, &str)]) -> TypeCatalog {
        let files: Vec<ParsedFile> = sources
            .iter()
            .map(|(module, code)| AstParser::parse_str(module, code).unwrap())
            .collect();
        SourceCatalog::build(&files).unwrap()
    }

    #[test]
    fn test_struct_fields_and_visibility() {
        let catalog = build(&[(
            "crate::models",
            r#"
            pub struct User {
                pub id: u64,
                pub(crate) name: String,
                secret: String,
            }
            "#,
        )]);

        let user = catalog.get("crate::models::User").unwrap();
        let names: Vec<(&str, bool)> = user
            .properties()
            .iter()
            .map(|p| (p.name.as_str(), p.public))
            .collect();
        assert_eq!(names, vec![("id", true), ("name", true), ("secret", false)]);
        assert!(user.serializer.is_none());
    }

    #[test]
    fn test_serde_derive_exposes_private_fields_and_optionality() {
        let catalog = build(&[(
            "crate::dto",
            r#"
            #[derive(Serialize, Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct Query {
                page_size: u32,
                #[serde(default)]
                page: u32,
                cursor: Option<String>,
                #[serde(rename = "q")]
                search_text: String,
            }
            "#,
        )]);

        let query = catalog.get("crate::dto::Query").unwrap();
        assert!(query.properties().iter().all(|p| p.public));

        let serializer = query.serializer.as_ref().unwrap();
        assert_eq!(serializer.fields["page_size"], FieldOptionality::Required);
        assert_eq!(serializer.fields["page"], FieldOptionality::Optional);
        assert_eq!(serializer.fields["cursor"], FieldOptionality::Optional);

        let names: Vec<String> = query
            .properties()
            .iter()
            .map(|p| MetadataDescriptor::of_property(&catalog, query, p).name)
            .collect();
        assert_eq!(names, vec!["pageSize", "page", "cursor", "q"]);
    }

    #[test]
    fn test_flatten_becomes_supertype() {
        let catalog = build(&[(
            "crate::models",
            r#"
            #[derive(Serialize)]
            pub struct Person { pub name: String, pub age: u8 }

            #[derive(Serialize)]
            pub struct Employee {
                pub name: String,
                pub role: String,
                #[serde(flatten)]
                pub person: Person,
            }
            "#,
        )]);

        let employee = catalog.get("crate::models::Employee").unwrap();
        assert_eq!(employee.properties().len(), 2);
        assert_eq!(employee.supertypes()[0].classifier, "crate::models::Person");
    }

    #[test]
    fn test_types_are_qualified_through_imports() {
        let catalog = build(&[
            (
                "crate::models::employee",
                "pub struct Employee { pub name: String }",
            ),
            (
                "crate::models::page",
                "pub struct Page<T> { pub items: Vec<T>, pub total: u64 }",
            ),
            (
                "crate::api",
                r#"
                use crate::models::employee::Employee;
                use super::models::page::{self, Page as Paged};

                pub struct Listing {
                    pub employees: Paged<Employee>,
                    pub other: page::Page<String>,
                }
                "#,
            ),
        ]);

        let page = catalog.get("crate::models::page::Page").unwrap();
        assert_eq!(page.type_params, vec!["T"]);
        assert_eq!(page.properties()[0].ty.qualified(), "Vec<T>");

        let listing = catalog.get("crate::api::Listing").unwrap();
        assert_eq!(
            listing.properties()[0].ty.qualified(),
            "crate::models::page::Page<crate::models::employee::Employee>"
        );
        assert_eq!(
            listing.properties()[1].ty.qualified(),
            "crate::models::page::Page<String>"
        );
    }

    #[test]
    fn test_inline_modules_and_same_module_lookup() {
        let catalog = build(&[(
            "crate",
            r#"
            pub mod shop {
                pub struct Item { pub sku: String }
                pub struct Order { pub items: Vec<Item> }
            }
            pub mod warehouse {
                pub struct Item { pub bin: String }
            }
            "#,
        )]);

        let order = catalog.get("crate::shop::Order").unwrap();
        assert_eq!(order.properties()[0].ty.qualified(), "Vec<crate::shop::Item>");
        assert!(catalog.get("crate::warehouse::Item").is_some());
    }

    #[test]
    fn test_unique_suffix_match_and_well_known_names() {
        let catalog = build(&[
            ("crate::models", "pub struct Address { pub city: String }"),
            (
                "crate::api",
                "pub struct Customer { pub address: Address, pub note: String }",
            ),
        ]);

        let customer = catalog.get("crate::api::Customer").unwrap();
        assert_eq!(customer.properties()[0].ty.classifier, "crate::models::Address");
        assert_eq!(customer.properties()[1].ty.classifier, "String");
    }

    #[test]
    fn test_enum_variants() {
        let catalog = build(&[(
            "crate::models",
            r#"
            #[derive(Serialize)]
            #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
            pub enum Status {
                Active,
                InProgress,
                #[serde(rename = "gone")]
                Deleted,
                #[serde(skip)]
                Internal,
                Custom(String),
            }
            "#,
        )]);

        let status = catalog.get("crate::models::Status").unwrap();
        match &status.kind {
            TypeDefKind::Enum { variants } => {
                assert_eq!(variants, &vec!["ACTIVE", "IN_PROGRESS", "gone"]);
            }
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_default_impl_marks_constructor_defaults() {
        let catalog = build(&[(
            "crate::config",
            r#"
            pub struct Paging { pub page: u32 }
            impl Default for Paging {
                fn default() -> Self { Self { page: 1 } }
            }
            #[derive(Default)]
            pub struct Filter { pub term: String }
            pub struct Strict { pub id: u32 }
            "#,
        )]);

        let defaulted = |name: &str| {
            catalog.get(name).unwrap().constructor.as_ref().unwrap()[0].has_default
        };
        assert!(defaulted("crate::config::Paging"));
        assert!(defaulted("crate::config::Filter"));
        assert!(!defaulted("crate::config::Strict"));
    }

    #[test]
    fn test_malformed_serde_attribute_is_recorded_per_field() {
        let catalog = build(&[(
            "crate",
            r#"
            #[derive(Deserialize)]
            pub struct Broken {
                #[serde(rename = 1)]
                pub value: u32,
            }
            "#,
        )]);

        let broken = catalog.get("crate::Broken").unwrap();
        let property = &broken.properties()[0];
        assert!(catalog.serializer_optionality(broken, property).is_err());
    }

    #[test]
    fn test_schema_attributes_and_skip() {
        let catalog = build(&[(
            "crate",
            r#"
            /// A registered account
            #[derive(Serialize)]
            #[serde(rename = "Account")]
            pub struct AccountDto {
                /// Login handle
                #[schema(rename = "login", min_length = 3)]
                pub handle: String,
                #[serde(skip)]
                pub cache: Vec<u8>,
                #[schema(required = false)]
                pub nickname: String,
            }
            "#,
        )]);

        let account = catalog.get("crate::AccountDto").unwrap();
        assert_eq!(account.rename.as_deref(), Some("Account"));
        assert_eq!(account.attributes.description.as_deref(), Some("A registered account"));

        let handle = &account.properties()[0];
        assert_eq!(handle.attributes.min_length, Some(3));
        assert_eq!(handle.attributes.description.as_deref(), Some("Login handle"));
        assert_eq!(MetadataDescriptor::of_property(&catalog, account, handle).name, "login");

        assert!(account.properties()[1].ignored);
        assert_eq!(account.properties()[2].required, Some(false));
    }

    #[test]
    fn test_invalid_constraints_fail_the_build() {
        let file = AstParser::parse_str(
            "crate",
            r#"
            pub struct Bad {
                #[schema(min_length = 9, max_length = 2)]
                pub code: String,
            }
            "#,
        )
        .unwrap();

        let err = SourceCatalog::build(&[file]).unwrap_err();
        assert!(matches!(err, Error::InvalidConstraint { .. }));
    }

    #[test]
    fn test_duplicates_and_test_modules_are_skipped() {
        let catalog = build(&[
            ("crate", "pub struct Shared { pub a: u8 }"),
            ("crate", "pub struct Shared { pub b: u8 }"),
            (
                "crate::api",
                "#[cfg(test)] mod tests { pub struct Fixture { pub x: u8 } }",
            ),
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("crate::Shared").unwrap().properties()[0].name, "a");
    }

    #[test]
    fn test_reexported_types_resolve() {
        let catalog = build(&[
            ("crate", "pub use models::Tag;"),
            ("crate::models", "pub struct Tag { pub label: String }"),
            ("crate::models::post", "pub struct Post { pub tag: crate::Tag }"),
        ]);

        let post = catalog.get("crate::models::post::Post").unwrap();
        assert_eq!(post.properties()[0].ty.classifier, "crate::models::Tag");
    }
}
