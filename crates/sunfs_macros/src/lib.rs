#![doc = include_str!("../README.md")]

extern crate proc_macro;
use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{Data, DataEnum, DataStruct, DeriveInput, Fields, parse_macro_input};

/// Derives the `Pack` and `Unpack` traits of `sunfs_types::xdr`.
///
/// Struct fields are packed in declaration order, the way XDR lays out its
/// structures. Enums must consist of unit variants only; they are encoded as
/// a single unsigned 32-bit discriminant taken from the variant's value.
#[proc_macro_derive(XdrCodec)]
pub fn derive_xdr_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Struct(DataStruct { fields, .. }) => derive_struct(fields),
        Data::Enum(data) => derive_enum(data),
        Data::Union(_) => panic!("XdrCodec cannot be derived for unions"),
    };

    let DerivedImpls {
        packed_size,
        pack,
        unpack,
    } = body;

    quote! {
        impl #impl_generics sunfs_types::xdr::Pack for #name #ty_generics #where_clause {
            fn packed_size(&self) -> usize {
                #packed_size
            }

            fn pack(&self, out: &mut impl std::io::Write) -> sunfs_types::xdr::Result<usize> {
                use sunfs_types::xdr::Pack;
                #pack
            }
        }

        impl #impl_generics sunfs_types::xdr::Unpack for #name #ty_generics #where_clause {
            fn unpack(input: &mut impl std::io::Read) -> sunfs_types::xdr::Result<(Self, usize)> {
                use sunfs_types::xdr::Unpack;
                #unpack
            }
        }
    }
    .into()
}

struct DerivedImpls {
    packed_size: proc_macro2::TokenStream,
    pack: proc_macro2::TokenStream,
    unpack: proc_macro2::TokenStream,
}

fn derive_struct(fields: &Fields) -> DerivedImpls {
    if matches!(fields, Fields::Unit) {
        return DerivedImpls {
            packed_size: quote! { 0 },
            pack: quote! {
                let _ = out;
                Ok(0)
            },
            unpack: quote! {
                let _ = input;
                Ok((Self, 0))
            },
        };
    }

    let accessors: Vec<proc_macro2::TokenStream> = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .map(|f| {
                let ident = &f.ident;
                quote! { self.#ident }
            })
            .collect(),
        Fields::Unnamed(unnamed) => (0..unnamed.unnamed.len())
            .map(|i| {
                let index = syn::Index::from(i);
                quote! { self.#index }
            })
            .collect(),
        Fields::Unit => Vec::new(),
    };

    let packed_size = quote! {
        let mut total = 0;
        #(total += sunfs_types::xdr::Pack::packed_size(&#accessors);)*
        total
    };

    let pack = quote! {
        let mut written = 0;
        #(written += #accessors.pack(out)?;)*
        Ok(written)
    };

    let bindings: Vec<syn::Ident> = (0..accessors.len())
        .map(|i| syn::Ident::new(&format!("field_{i}"), Span::call_site()))
        .collect();
    let construct = match fields {
        Fields::Named(named) => {
            let names = named.named.iter().map(|f| &f.ident);
            quote! { Self { #(#names: #bindings),* } }
        }
        Fields::Unnamed(_) => quote! { Self(#(#bindings),*) },
        Fields::Unit => quote! { Self },
    };

    let unpack = quote! {
        let mut read = 0;
        #(
            let (#bindings, n) = sunfs_types::xdr::Unpack::unpack(input)?;
            read += n;
        )*
        Ok((#construct, read))
    };

    DerivedImpls {
        packed_size,
        pack,
        unpack,
    }
}

fn derive_enum(data: &DataEnum) -> DerivedImpls {
    for variant in &data.variants {
        assert!(
            matches!(variant.fields, Fields::Unit),
            "XdrCodec enums must have unit variants only; implement Pack/Unpack by hand \
             for discriminated unions carrying payloads"
        );
    }

    let pack_arms = data.variants.iter().map(|v| {
        let ident = &v.ident;
        quote! { Self::#ident => (*self as u32).pack(out), }
    });
    let unpack_arms = data.variants.iter().map(|v| {
        let ident = &v.ident;
        quote! { x if x == Self::#ident as u32 => Ok(Self::#ident), }
    });

    DerivedImpls {
        packed_size: quote! { 4 },
        pack: quote! {
            match self {
                #(#pack_arms)*
            }
        },
        unpack: quote! {
            let (tag, read) = u32::unpack(input)?;
            let value = match tag {
                #(#unpack_arms)*
                _ => Err(sunfs_types::xdr::Error::InvalidEnumValue(tag)),
            };
            value.map(|v| (v, read))
        },
    }
}
