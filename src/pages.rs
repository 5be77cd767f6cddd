//! Page shells
//!
//! Minimal HTML for each page. The route gate has already run by the time
//! these handlers see a request.

use crate::auth::gate::{HOME_PATH, LOGIN_PATH, REGISTER_PATH};
use crate::auth::verifier::VerifiedToken;
use axum::{
    extract::{Path, Request},
    response::Html,
};

fn shell(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="id">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · TaskDeck</title>
</head>
<body>
{body}
</body>
</html>"#,
        title = html_escape::encode_text(title),
        body = body,
    ))
}

pub async fn home() -> Html<String> {
    shell(
        "Welcome",
        &format!(
            r#"<main><h1>TaskDeck</h1>
<p><a href="{LOGIN_PATH}">Masuk</a> · <a href="{REGISTER_PATH}">Daftar</a> · <a href="{HOME_PATH}">Dashboard</a></p></main>"#
        ),
    )
}

pub async fn login() -> Html<String> {
    shell(
        "Login",
        &format!(
            r#"<main id="login">
<form data-action="login">
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" minlength="6" required></label>
<button type="submit">Masuk</button>
</form>
<p>Belum punya akun? <a href="{REGISTER_PATH}">Daftar</a></p>
</main>"#
        ),
    )
}

pub async fn register() -> Html<String> {
    shell(
        "Register",
        &format!(
            r#"<main id="register">
<form data-action="register">
<label>Nama <input type="text" name="name" minlength="2" required></label>
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" minlength="6" required></label>
<label>Konfirmasi password <input type="password" name="confirmPassword" minlength="6" required></label>
<button type="submit">Daftar</button>
</form>
<p>Sudah punya akun? <a href="{LOGIN_PATH}">Masuk</a></p>
</main>"#
        ),
    )
}

fn greeting(verified: Option<&VerifiedToken>) -> String {
    let who = verified
        .map(|v| v.email.clone().unwrap_or_else(|| v.uid.clone()))
        .unwrap_or_else(|| "User".to_string());
    format!("<h1>Halo, {}</h1>", html_escape::encode_text(&who))
}

pub async fn dashboard(request: Request) -> Html<String> {
    let verified = request.extensions().get::<VerifiedToken>();
    shell(
        "Dashboard",
        &format!(
            r#"<main id="dashboard" data-api="{HOME_PATH}/api">
{}
<section id="stats"></section>
<section id="weather"></section>
<p><a href="{HOME_PATH}/task">Tugas</a></p>
</main>"#,
            greeting(verified)
        ),
    )
}

pub async fn dashboard_section(Path(rest): Path<String>, request: Request) -> Html<String> {
    let verified = request.extensions().get::<VerifiedToken>();
    shell(
        &rest,
        &format!(
            r#"<main id="dashboard-section" data-section="{}">
{}
<p><a href="{HOME_PATH}">Dashboard</a></p>
</main>"#,
            html_escape::encode_double_quoted_attribute(&rest),
            greeting(verified)
        ),
    )
}
