use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Type};

// 检测类型是否是 Option<T>
fn is_option(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

// 字段上的 #[field(...)] 配置
#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    skip: bool,
}

fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("field") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.rename = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported field attribute, expected `rename` or `skip`"))
            }
        })?;
    }

    Ok(attrs)
}

/// 为结构体生成 `ruleform::IntoFieldSources` 实现
///
/// 每个命名字段成为一个字段值来源，值通过 `ToString` 取得；
/// `Option<T>` 为 `None` 时值为空字符串。
///
/// - `#[field(rename = "...")]`：使用另一个字段名
/// - `#[field(skip)]`：不生成来源
#[proc_macro_derive(IntoFieldSources, attributes(field))]
pub fn derive_into_field_sources(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "IntoFieldSources requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "IntoFieldSources can only be derived for structs",
            ))
        }
    };

    let mut pushes = Vec::new();
    for field in fields {
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }

        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = attrs.rename.unwrap_or_else(|| ident.to_string());

        let value = if is_option(&field.ty) {
            quote! {
                match &self.#ident {
                    ::std::option::Option::Some(__val) => ::std::string::ToString::to_string(__val),
                    ::std::option::Option::None => ::std::string::String::new(),
                }
            }
        } else {
            quote! { ::std::string::ToString::to_string(&self.#ident) }
        };

        pushes.push(quote! {
            __sources.push(::ruleform::FieldValue::shared(#field_name, #value));
        });
    }

    Ok(quote! {
        impl #impl_generics ::ruleform::IntoFieldSources for #name #ty_generics #where_clause {
            fn into_field_sources(
                &self,
            ) -> ::std::vec::Vec<::std::sync::Arc<dyn ::ruleform::FieldSource>> {
                let mut __sources: ::std::vec::Vec<::std::sync::Arc<dyn ::ruleform::FieldSource>> =
                    ::std::vec::Vec::new();
                #(#pushes)*
                __sources
            }
        }
    })
}
