use quote::{format_ident, quote};

/// Generates one `#[test]` per `.lox` script below `bin/tests/lox`, each calling `lox_expect`.
#[proc_macro]
pub fn generate_tests(_: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let root_dir = format!("{}/../lox", env!("CARGO_MANIFEST_DIR"));
    let tests = walkdir::WalkDir::new(&root_dir)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|entry| entry.path().extension() == Some("lox".as_ref()))
        .map(|entry| {
            let script_path = entry.path().to_string_lossy().to_string();
            let relative_path = entry
                .path()
                .strip_prefix(&root_dir)
                .unwrap_or(entry.path())
                .with_extension("")
                .to_string_lossy()
                .replace(['/', '\\', '-'], "_");
            let test_ident = format_ident!("{}", relative_path);
            quote! {
                #[test]
                fn #test_ident() {
                    lox_expect(&std::fs::read_to_string(#script_path).unwrap());
                }
            }
        });

    quote! {
        #[ctor::ctor]
        fn init() {
            let _ = env_logger::builder().is_test(true).try_init();
        }

        #(#tests)*
    }
    .into()
}
