//! Derive macros for dialectic entities.
//!
//! `#[derive(Entity)]` builds an entity descriptor once per type and
//! `#[derive(SqlEnum)]` maps a fieldless enum to a column value stored by
//! name or by ordinal.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, ExprLit, ExprUnary, Fields, Lit, Meta,
    Path, UnOp,
};

/// Derives `Entity` for a struct with named fields.
///
/// # Attributes
///
/// - `#[entity(table = "table_name")]` - SQL table name (optional, defaults
///   to the snake_case struct name)
/// - `#[relation(name = "orders", target = Order, local_key = "id",
///   foreign_key = "employee_id")]` - a navigation usable with `include`;
///   may be repeated
///
/// # Field Attributes
///
/// - `#[column(primary_key)]` - Marks the field as primary key
/// - `#[column(name = "column_name")]` - SQL column name (optional,
///   defaults to the field name)
/// - `#[column(nullable)]` - Marks the column as nullable; `Option<T>`
///   fields are nullable without it
/// - `#[column(enum_as_int)]` / `#[column(enum_as_text)]` - Overrides the
///   dialect's default enum storage
/// - `#[column(skip)]` - The field is not a column
///
/// The column type comes from the field type's `SqlType` implementation.
#[proc_macro_derive(Entity, attributes(entity, column, relation))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `SqlEnum`, `ToSqlValue` and `SqlType` for a fieldless enum.
///
/// Ordinals follow the explicit discriminants, counting up from the last
/// one like Rust does. `#[sql_enum(rename = "...")]` on a variant changes
/// its stored name.
#[proc_macro_derive(SqlEnum, attributes(sql_enum))]
pub fn derive_sql_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_sql_enum_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, &struct_name.to_string())?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Entity derive only supports structs",
            ));
        }
    };

    let mut columns = Vec::new();
    for field in fields {
        let attrs = parse_column_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = attrs.name.unwrap_or_else(|| ident.to_string());
        let ty = &field.ty;
        let nullable = attrs.nullable;
        let primary_key = attrs.primary_key;
        let storage = match attrs.storage {
            Some(Storage::Integer) => quote! {
                column = column.enum_storage(::dialectic_core::schema::EnumStorage::Integer);
            },
            Some(Storage::Text) => quote! {
                column = column.enum_storage(::dialectic_core::schema::EnumStorage::Text);
            },
            None => quote! {},
        };
        columns.push(quote! {
            {
                let mut column = ::dialectic_core::schema::ColumnDescriptor::new(
                    #name,
                    <#ty as ::dialectic_core::schema::SqlType>::COLUMN_TYPE,
                );
                if #nullable || <#ty as ::dialectic_core::schema::SqlType>::NULLABLE {
                    column = column.nullable();
                }
                if #primary_key {
                    column = column.primary_key();
                }
                #storage
                column
            }
        });
    }

    let relations = parse_relations(&input.attrs)?
        .into_iter()
        .map(|r| {
            let RelationAttrs {
                name,
                target,
                local_key,
                foreign_key,
            } = r;
            quote! {
                ::dialectic_core::schema::Relation::new(
                    #name,
                    <#target as ::dialectic_core::schema::Entity>::descriptor,
                    #local_key,
                    #foreign_key,
                )
            }
        });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::dialectic_core::schema::Entity for #struct_name #ty_generics
        #where_clause
        {
            fn descriptor() -> &'static ::dialectic_core::schema::EntityDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<
                    ::dialectic_core::schema::EntityDescriptor,
                > = ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    ::dialectic_core::schema::EntityDescriptor::builder(#table_name)
                        #(.column(#columns))*
                        #(.relation(#relations))*
                        .build()
                })
            }
        }
    })
}

fn derive_sql_enum_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let enum_name = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "SqlEnum derive only supports enums",
        ));
    };

    let mut name_arms = Vec::new();
    let mut ordinal_arms = Vec::new();
    let mut next: i64 = 0;
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "SqlEnum variants cannot carry fields",
            ));
        }
        let ident = &variant.ident;
        let ordinal = match &variant.discriminant {
            Some((_, expr)) => discriminant_value(expr)?,
            None => next,
        };
        next = ordinal + 1;
        let name = get_variant_name(&variant.attrs)?.unwrap_or_else(|| ident.to_string());
        name_arms.push(quote! { Self::#ident => #name });
        ordinal_arms.push(quote! { Self::#ident => #ordinal });
    }

    Ok(quote! {
        impl ::dialectic_core::builder::SqlEnum for #enum_name {
            fn variant_name(&self) -> &'static str {
                match self {
                    #(#name_arms,)*
                }
            }

            fn ordinal(&self) -> i64 {
                match self {
                    #(#ordinal_arms,)*
                }
            }
        }

        impl ::dialectic_core::builder::ToSqlValue for #enum_name {
            fn to_sql_value(self) -> ::dialectic_core::builder::SqlValue {
                ::dialectic_core::builder::SqlValue::Enum(
                    ::dialectic_core::builder::SqlEnum::to_enum_value(&self),
                )
            }
        }

        impl ::dialectic_core::schema::SqlType for #enum_name {
            const COLUMN_TYPE: ::dialectic_core::schema::ColumnType =
                ::dialectic_core::schema::ColumnType::Enum;
        }
    })
}

enum Storage {
    Integer,
    Text,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
    nullable: bool,
    skip: bool,
    storage: Option<Storage>,
}

struct RelationAttrs {
    name: String,
    target: Path,
    local_key: String,
    foreign_key: String,
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

fn get_table_name(attrs: &[Attribute], struct_name: &str) -> syn::Result<String> {
    let mut table_name = None;
    for attr in attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    table_name = Some(string_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unknown entity attribute"))
                }
            })?;
        }
    }
    Ok(table_name.unwrap_or_else(|| to_snake_case(struct_name)))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("column") || matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                result.primary_key = true;
            } else if meta.path.is_ident("nullable") {
                result.nullable = true;
            } else if meta.path.is_ident("skip") {
                result.skip = true;
            } else if meta.path.is_ident("enum_as_int") {
                result.storage = Some(Storage::Integer);
            } else if meta.path.is_ident("enum_as_text") {
                result.storage = Some(Storage::Text);
            } else if meta.path.is_ident("name") {
                result.name = Some(string_value(&meta)?);
            } else {
                return Err(meta.error("unknown column attribute"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

fn parse_relations(attrs: &[Attribute]) -> syn::Result<Vec<RelationAttrs>> {
    let mut relations = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("relation") {
            continue;
        }
        let (mut name, mut target, mut local_key, mut foreign_key) = (None, None, None, None);
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(string_value(&meta)?);
            } else if meta.path.is_ident("target") {
                target = Some(meta.value()?.parse::<Path>()?);
            } else if meta.path.is_ident("local_key") {
                local_key = Some(string_value(&meta)?);
            } else if meta.path.is_ident("foreign_key") {
                foreign_key = Some(string_value(&meta)?);
            } else {
                return Err(meta.error("unknown relation attribute"));
            }
            Ok(())
        })?;
        match (name, target, local_key, foreign_key) {
            (Some(name), Some(target), Some(local_key), Some(foreign_key)) => {
                relations.push(RelationAttrs {
                    name,
                    target,
                    local_key,
                    foreign_key,
                });
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    attr,
                    "relation needs name, target, local_key and foreign_key",
                ));
            }
        }
    }
    Ok(relations)
}

fn get_variant_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in attrs {
        if attr.path().is_ident("sql_enum") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    name = Some(string_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unknown sql_enum attribute"))
                }
            })?;
        }
    }
    Ok(name)
}

fn discriminant_value(expr: &Expr) -> syn::Result<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(i), ..
        }) => i.base10_parse(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => discriminant_value(expr).map(|v| -v),
        other => Err(syn::Error::new_spanned(
            other,
            "SqlEnum discriminants must be integer literals",
        )),
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
