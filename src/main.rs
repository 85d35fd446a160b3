use dataflow_expr::translate::Translator;

const SAMPLE: &str = r#"
    out.col_a :: '+' ;
    out.col_b :: decimal_lpad(decimal_strip(in0.col_b), 20);
    out.col_c :: string_lpad(in0.col_c, 10);
    out.col_d :: date_to_string(in0.updated_at, 'YYYY-MM-DD HH24:MI:SS');
    out.col_e :: unknown_func(in0.col_e)
"#;

fn main() {
    env_logger::init();

    // Translate the mapping file given as the first argument, or the
    // built-in sample when run bare.
    let source = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Could not read {path}: {e}");
                std::process::exit(1);
            }
        },
        None => SAMPLE.to_string(),
    };

    let translator = Translator::default();
    let projection = translator.convert(&source);

    println!("Generated Spark SQL expressions:");
    println!("{projection}");
    println!();
    println!("Full Spark SQL query:");
    println!("SELECT {projection} FROM {}", translator.input_alias);
}
