extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{self, AttributeArgs, Data, DeriveInput, Fields, Ident, Lit, LitStr, Meta, NestedMeta, Path, Type};

///Turns an enum of presentation properties into a typed property set.
///
///Every variant must carry exactly one field, the parsed value of that
///property. The property name is the variant name in kebab-case
///(`StrokeLinecap` is `stroke-linecap`). Generated items:
///
/// - a struct (named by `set = "..."`, default `Properties`) with one
///   `Option` field per variant, in snake_case,
/// - `apply`, which overrides a single property (last writer wins),
/// - `inherit`, which fills unset properties from a parent set,
/// - `Property::parse(name, value)`, which returns `None` for unknown names
///   and otherwise parses the value with the field type's `FromStr`, converting
///   its error into the type named by `error = "..."`.
#[proc_macro_attribute]
pub fn style_properties(attributes: TokenStream, items: TokenStream) -> TokenStream {
    let args = syn::parse_macro_input!(attributes as AttributeArgs);
    let ast = syn::parse_macro_input!(items as DeriveInput);

    match impl_style_properties(args, &ast) {
	Ok(r) => r.into(),
	Err(e) => e.to_compile_error().into(),
    }
}

struct Args {
    set: Ident,
    error: Path,
}

fn parse_args(args: AttributeArgs) -> syn::Result<Args> {
    let mut set = None;
    let mut error = None;

    for arg in args {
	let name_value = match arg {
	    NestedMeta::Meta(Meta::NameValue(nv)) => nv,
	    other => return Err(syn::Error::new_spanned(other, "expected `key = \"value\"`")),
	};

	let value: &LitStr = match &name_value.lit {
	    Lit::Str(s) => s,
	    other => return Err(syn::Error::new_spanned(other, "expected a string literal")),
	};

	if name_value.path.is_ident("set") {
	    set = Some(value.parse::<Ident>()?);
	} else if name_value.path.is_ident("error") {
	    error = Some(value.parse::<Path>()?);
	} else {
	    return Err(syn::Error::new_spanned(name_value.path, "unknown argument, expected `set` or `error`"));
	}
    }

    let error = error.ok_or_else(|| syn::Error::new(Span::call_site(), "missing `error = \"...\"` argument"))?;

    Ok(Args {
	set: set.unwrap_or_else(|| Ident::new("Properties", Span::call_site())),
	error,
    })
}

fn snake_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 4);

    for (i, c) in input.chars().enumerate() {
	if i > 0 && c.is_ascii_uppercase() {
	    result.push('_');
	}
	result.push(c.to_ascii_lowercase());
    }

    result
}

struct Property {
    variant: Ident,
    field: Ident,
    css_name: String,
    ty: Type,
}

fn parse_variants(def: &DeriveInput) -> syn::Result<Vec<Property>> {
    let data_enum = match &def.data {
	Data::Enum(data_enum) => data_enum,
	_ => return Err(syn::Error::new_spanned(&def.ident, "must be defined with an enum")),
    };

    let mut properties = Vec::new();

    for v in data_enum.variants.iter() {
	let ty = match &v.fields {
	    Fields::Unnamed(fs) if fs.unnamed.len() == 1 => fs.unnamed[0].ty.clone(),
	    _ => return Err(syn::Error::new_spanned(v, "variants must carry exactly one unnamed field")),
	};

	let snake = snake_case(&v.ident.to_string());

	properties.push(Property {
	    variant: v.ident.clone(),
	    field: Ident::new(&snake, v.ident.span()),
	    css_name: snake.replace('_', "-"),
	    ty,
	});
    }

    Ok(properties)
}

fn impl_style_properties(args: AttributeArgs, def: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    if !def.generics.params.is_empty() {
	return Err(syn::Error::new_spanned(&def.generics, "generic property enums are not supported"));
    }

    let Args { set, error } = parse_args(args)?;
    let properties = parse_variants(def)?;

    let vis = &def.vis;
    let enum_name = &def.ident;

    let variants: Vec<_> = properties.iter().map(|p| &p.variant).collect();
    let fields: Vec<_> = properties.iter().map(|p| &p.field).collect();
    let css_names: Vec<_> = properties.iter().map(|p| &p.css_name).collect();
    let types: Vec<_> = properties.iter().map(|p| &p.ty).collect();

    let set_doc = format!("Property set generated from [`{}`]. `None` means unset.", enum_name);

    Ok(quote! {
	#def

	#[doc = #set_doc]
	#[derive(Debug, Clone, Default, PartialEq)]
	#vis struct #set {
	    #(pub #fields : Option<#types>),*
	}

	impl #set {
	    pub fn new() -> Self {
		Self::default()
	    }

	    /// Sets one property, replacing any earlier value.
	    pub fn apply(&mut self, property: #enum_name) {
		match property {
		    #(#enum_name :: #variants (v) => self. #fields = Some(v),)*
		}
	    }

	    /// Fills every property still unset from `parent`.
	    pub fn inherit(&mut self, parent: &Self) {
		#(
		    if self. #fields .is_none() {
			self. #fields = parent. #fields .clone();
		    }
		)*
	    }

	    pub fn is_empty(&self) -> bool {
		true #(&& self. #fields .is_none())*
	    }
	}

	impl #enum_name {
	    /// Every recognized property name.
	    pub const NAMES: &'static [&'static str] = &[#(#css_names),*];

	    /// Parses a `name: value` declaration. Unknown names yield `None`.
	    pub fn parse(name: &str, value: &str) -> Option<::core::result::Result<Self, #error>> {
		match name.trim() {
		    #(#css_names => Some(
			value.trim()
			    .parse::<#types>()
			    .map(#enum_name :: #variants)
			    .map_err(::core::convert::Into::into)
		    ),)*
		    _ => None,
		}
	    }

	    pub fn name(&self) -> &'static str {
		match self {
		    #(#enum_name :: #variants (_) => #css_names,)*
		}
	    }
	}
    })
}
