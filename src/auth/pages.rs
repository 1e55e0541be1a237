use axum::response::Html;

fn message_block(msg: Option<&str>) -> String {
    match msg {
        Some(m) => format!(r#"<div class="alert">{m}</div>"#),
        None => String::new(),
    }
}

pub fn login_page(msg: Option<&'static str>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Login</title></head>
<body>
{msg}
<form method="post" action="/auth/">
  <input type="text" name="email" placeholder="Username" required>
  <input type="password" name="password" placeholder="Password" required>
  <button type="submit">Login</button>
</form>
<a href="/auth/register">Register</a>
</body>
</html>"#,
        msg = message_block(msg)
    ))
}

pub fn register_page(msg: Option<&'static str>) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Register</title></head>
<body>
{msg}
<form method="post" action="/auth/register">
  <input type="email" name="email" placeholder="Email" required>
  <input type="text" name="username" placeholder="Username" required>
  <input type="text" name="firstname" placeholder="First name" required>
  <input type="text" name="lastname" placeholder="Last name" required>
  <input type="tel" name="phone_number" placeholder="Phone number">
  <input type="password" name="password" placeholder="Password" required>
  <input type="password" name="password2" placeholder="Confirm password" required>
  <button type="submit">Register</button>
</form>
<a href="/auth/">Login</a>
</body>
</html>"#,
        msg = message_block(msg)
    ))
}
