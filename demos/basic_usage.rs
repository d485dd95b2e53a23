use errs::{e, Error, Kind, Result};

fn parse_age(raw: &str) -> Result<u8> {
    raw.parse::<u8>().map_err(|source| {
        e!(
            op("users/parse_age"),
            kind(Kind::Validation),
            param("age"),
            code("AGE_NOT_A_NUMBER"),
            source(source),
        )
    })
}

fn register(name: &str, age: &str) -> Result<()> {
    let age = parse_age(age).map_err(|inner| e!(op("users/Service.Register"), user(name), wrap(inner)))?;
    println!("registered {name}, age {age}");
    Ok(())
}

fn main() {
    println!("--- Basic Usage Example ---\n");

    register("erin", "34").unwrap();

    let err = register("frank", "thirty").unwrap_err();

    // Kind, Param and Code were pulled up from the inner error.
    println!("1. Display (what a client sees for a 400):");
    println!("   \"{err}\"");

    println!("\n2. Classification:");
    println!("   kind        = {}", err.kind());
    println!("   is validation? {}", err.kind_is(Kind::Validation));
    println!("   code        = {:?}", err.code().map(|c| c.as_str()));
    println!("   param       = {:?}", err.param().map(|p| p.as_str()));

    println!("\n3. Op stack (root first):");
    for op in err.op_stack() {
        println!("   {op}");
    }

    println!("\n4. Structured log line (user shown only as a flag):");
    println!("   {}", err.log());

    println!("\n5. A builder with no attributes is itself an error:");
    let bad = Error::builder().build();
    println!("   {:?}", bad);
}
