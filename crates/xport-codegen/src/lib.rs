// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `#[derive(Exportable)]` for xport.
//!
//! Structs with named fields become record types: the derive implements
//! `xport::Exportable` (the class schema) and `xport::ExportType` (conversion
//! to and from graph values). Fieldless enums become enumeration types.
//!
//! Container attributes:
//! - `#[export(name = "pkg.Type")]` sets the local type name. Without it the
//!   name is `module_path!()` followed by `::` and the type identifier.
//! - `#[export(final)]` marks the record type final, so slots declared with it
//!   never carry a type id.
//!
//! Field attributes:
//! - `#[export(name = "...")]` renames the field.
//! - `#[export(skip)]` leaves the field out of the schema; it is restored from
//!   `Default` on import.
//!
//! Variant attribute: `#[export(name = "...")]` renames the constant.
//!
//! Structs must implement `Default`: the default instance provides the field
//! defaults that unchanged fields are compared against on export.

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use std::collections::HashSet;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitStr};

#[proc_macro_derive(Exportable, attributes(export))]
pub fn derive_exportable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Exportable cannot be derived for generic types; build a ClassSchema with type_params instead",
        ));
    }
    let attrs = ContainerAttrs::parse(&input.attrs)?;
    let type_name = match &attrs.name {
        Some(name) => quote!(#name),
        None => {
            let ident = input.ident.to_string();
            quote!(concat!(module_path!(), "::", #ident))
        }
    };

    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => {
                let mut fields = Vec::new();
                let mut seen = HashSet::new();
                for field in &named.named {
                    let field_attrs = FieldAttrs::parse(&field.attrs)?;
                    if field_attrs.skip {
                        continue;
                    }
                    let ident = field.ident.clone().ok_or_else(|| {
                        syn::Error::new_spanned(field, "expected a named field")
                    })?;
                    let wire = field_attrs.name.unwrap_or_else(|| {
                        let s = ident.to_string();
                        let s = s.strip_prefix("r#").unwrap_or(&s);
                        LitStr::new(s.trim_start_matches('_'), ident.span())
                    });
                    if !seen.insert(wire.value()) {
                        return Err(syn::Error::new_spanned(
                            field,
                            format!("duplicate exported field name `{}`", wire.value()),
                        ));
                    }
                    fields.push(StructField {
                        ident,
                        wire,
                        ty: field.ty.clone(),
                    });
                }
                Ok(expand_struct(&input.ident, &type_name, attrs.is_final, &fields))
            }
            Fields::Unit => Ok(expand_struct(&input.ident, &type_name, attrs.is_final, &[])),
            Fields::Unnamed(_) => Err(syn::Error::new_spanned(
                &input.ident,
                "Exportable requires named fields; tuple structs have no field names to put on the wire",
            )),
        },
        Data::Enum(data) => {
            if data.variants.is_empty() {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Exportable enums need at least one variant",
                ));
            }
            let mut variants = Vec::new();
            let mut seen = HashSet::new();
            for variant in &data.variants {
                if !matches!(variant.fields, Fields::Unit) {
                    return Err(syn::Error::new_spanned(
                        variant,
                        "Exportable enums must be fieldless",
                    ));
                }
                let variant_attrs = FieldAttrs::parse(&variant.attrs)?;
                if variant_attrs.skip {
                    return Err(syn::Error::new_spanned(
                        variant,
                        "enum constants cannot be skipped",
                    ));
                }
                let constant = variant_attrs
                    .name
                    .unwrap_or_else(|| LitStr::new(&variant.ident.to_string(), variant.ident.span()));
                if !seen.insert(constant.value()) {
                    return Err(syn::Error::new_spanned(
                        variant,
                        format!("duplicate enum constant `{}`", constant.value()),
                    ));
                }
                variants.push((variant.ident.clone(), constant));
            }
            Ok(expand_enum(&input.ident, &type_name, &variants))
        }
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Exportable cannot be derived for unions",
        )),
    }
}

// ============================================================================
// Attributes
// ============================================================================

#[derive(Default)]
struct ContainerAttrs {
    name: Option<LitStr>,
    is_final: bool,
}

impl ContainerAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("export")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    out.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("final") {
                    out.is_final = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown export attribute; expected `name` or `final`"))
                }
            })?;
        }
        Ok(out)
    }
}

#[derive(Default)]
struct FieldAttrs {
    name: Option<LitStr>,
    skip: bool,
}

impl FieldAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("export")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    out.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    out.skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown export attribute; expected `name` or `skip`"))
                }
            })?;
        }
        Ok(out)
    }
}

// ============================================================================
// Code generation
// ============================================================================

struct StructField {
    ident: Ident,
    wire: LitStr,
    ty: syn::Type,
}

fn expand_struct(
    ident: &Ident,
    type_name: &TokenStream2,
    is_final: bool,
    fields: &[StructField],
) -> TokenStream2 {
    let idents: Vec<_> = fields.iter().map(|f| &f.ident).collect();
    let wires: Vec<_> = fields.iter().map(|f| &f.wire).collect();
    let types: Vec<_> = fields.iter().map(|f| &f.ty).collect();
    let indices: Vec<_> = (0..fields.len()).collect();

    quote! {
        impl ::xport::Exportable for #ident {
            fn class_schema() -> ::std::sync::Arc<::xport::ClassSchema> {
                static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<::xport::ClassSchema>> =
                    ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(SCHEMA.get_or_init(|| {
                    #[allow(unused_variables)]
                    let prototype = <Self as ::core::default::Default>::default();
                    #[allow(unused_mut, unused_variables)]
                    let mut scratch = ::xport::Graph::new();
                    let builder = ::xport::ClassSchema::builder(#type_name)
                        .final_type(#is_final)
                        #(
                            .field_with_default(
                                #wires,
                                <#types as ::xport::ExportType>::descriptor(),
                                ::xport::ExportType::to_value(&prototype.#idents, &mut scratch),
                            )
                        )*;
                    match builder.build() {
                        ::core::result::Result::Ok(schema) => schema,
                        ::core::result::Result::Err(e) => {
                            ::core::panic!("invalid schema for {}: {}", #type_name, e)
                        }
                    }
                }))
            }
        }

        impl ::xport::ExportType for #ident {
            fn descriptor() -> ::xport::TypeRef {
                ::xport::TypeDescriptor::reflective(#type_name, #is_final)
            }

            #[allow(unused_variables)]
            fn to_value(&self, graph: &mut ::xport::Graph) -> ::xport::Value {
                #[allow(unused_mut)]
                let mut record = ::xport::Record::new(<Self as ::xport::Exportable>::class_schema());
                #(
                    let value = ::xport::ExportType::to_value(&self.#idents, graph);
                    if let ::core::option::Option::Some(slot) = record.field_mut(#indices) {
                        *slot = value;
                    }
                )*
                ::xport::Value::Ref(graph.alloc(::xport::Object::Record(record)))
            }

            fn from_value(
                value: &::xport::Value,
                graph: &::xport::Graph,
            ) -> ::core::result::Result<Self, ::xport::ConvertError> {
                let record = ::xport::typed::expect_record(value, graph, #type_name)?;
                #[allow(unused_mut)]
                let mut out = <Self as ::core::default::Default>::default();
                #(
                    if let ::core::option::Option::Some(field) = record.get(#wires) {
                        if !field.is_null() {
                            out.#idents = ::xport::ExportType::from_value(field, graph)?;
                        }
                    }
                )*
                ::core::result::Result::Ok(out)
            }

            fn register(registry: &mut ::xport::TypeRegistryBuilder) {
                if registry.add_class(<Self as ::xport::Exportable>::class_schema()) {
                    #( <#types as ::xport::ExportType>::register(registry); )*
                }
            }
        }
    }
}

fn expand_enum(ident: &Ident, type_name: &TokenStream2, variants: &[(Ident, LitStr)]) -> TokenStream2 {
    let names: Vec<_> = variants.iter().map(|(v, _)| v).collect();
    let constants: Vec<_> = variants.iter().map(|(_, c)| c).collect();

    quote! {
        impl ::xport::ExportEnum for #ident {
            fn enum_schema() -> ::std::sync::Arc<::xport::EnumSchema> {
                static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<::xport::EnumSchema>> =
                    ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(
                    SCHEMA.get_or_init(|| ::xport::EnumSchema::new(#type_name, [#(#constants),*])),
                )
            }
        }

        impl ::xport::ExportType for #ident {
            fn descriptor() -> ::xport::TypeRef {
                <Self as ::xport::ExportEnum>::enum_schema().descriptor()
            }

            fn to_value(&self, _graph: &mut ::xport::Graph) -> ::xport::Value {
                let constant = match self {
                    #( Self::#names => #constants, )*
                };
                ::xport::Value::enumeration(#type_name, constant)
            }

            fn from_value(
                value: &::xport::Value,
                graph: &::xport::Graph,
            ) -> ::core::result::Result<Self, ::xport::ConvertError> {
                match value {
                    ::xport::Value::Enum(e) if &*e.type_name == #type_name => match &*e.constant {
                        #( #constants => ::core::result::Result::Ok(Self::#names), )*
                        _ => ::core::result::Result::Err(
                            ::xport::ConvertError::unexpected(#type_name, value, graph),
                        ),
                    },
                    _ => ::core::result::Result::Err(
                        ::xport::ConvertError::unexpected(#type_name, value, graph),
                    ),
                }
            }

            fn register(registry: &mut ::xport::TypeRegistryBuilder) {
                registry.add_enum(<Self as ::xport::ExportEnum>::enum_schema());
            }
        }
    }
}
