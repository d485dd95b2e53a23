use errs::{e, respond, Error, Kind, ResponseConfig};
use std::io;

fn show(label: &str, config: &ResponseConfig, err: Option<&(dyn std::error::Error + 'static)>) {
    let response = respond(config, err);
    println!("{label}");
    println!("   status: {}", response.status());
    for (name, value) in response.headers() {
        println!("   {name}: {}", value.to_str().unwrap_or("<binary>"));
    }
    println!("   body:   {}\n", response.body().unwrap_or("<none>"));
}

fn main() {
    tracing_subscriber::fmt().with_target(true).init();

    let config = ResponseConfig::from_env().unwrap_or_else(|err| {
        eprintln!("falling back to defaults: {err}");
        ResponseConfig::default()
    });

    println!("--- HTTP Surfacing Example ---\n");

    show("nil error", &config, None);

    let foreign = io::Error::other("socket hang up");
    show("foreign error", &config, Some(&foreign));

    let unauthenticated = Error::unauthenticated("movies", "token expired");
    show("unauthenticated", &config, Some(&unauthenticated));

    let unauthorized = Error::unauthorized("admin role required");
    show("unauthorized", &config, Some(&unauthorized));

    let exist = e!(
        op("movie/Service.Create"),
        kind(Kind::Exist),
        code("E1"),
        param("name"),
        msg("already there"),
    );
    show("item already exists", &config, Some(&exist));

    let database = e!(
        op("movie/Service.Create"),
        wrap(e!(op("db/Exec"), kind(Kind::Database), msg("connection refused"))),
    );
    show("database error (redacted)", &config, Some(&database));
}
