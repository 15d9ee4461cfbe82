//! Pages of the IoT app.

const STYLE: &str = r"
<style>
    body { font-family: system-ui, -apple-system, sans-serif; background: #f8fafc; color: #1e293b; margin: 0; }
    .container { max-width: 960px; margin: 0 auto; padding: 1.5rem; }
    nav a { margin-right: 1rem; color: #2563eb; text-decoration: none; }
    form { display: grid; gap: 0.75rem; max-width: 360px; margin-top: 1rem; }
    input { padding: 0.5rem; border: 1px solid #e2e8f0; border-radius: 0.375rem; }
    button { padding: 0.5rem 1rem; border: 1px solid #2563eb; border-radius: 0.375rem; background: #2563eb; color: white; cursor: pointer; }
    #status { color: #64748b; font-size: 0.875rem; margin-top: 0.5rem; }
    #graph { width: 100%; height: 420px; margin-top: 1rem; }
</style>";

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>{STYLE}
</head>
<body>
<div class="container">
    <nav><a href="/">Home</a><a href="/login">Log in</a><a href="/signup">Sign up</a><a href="/profile">Profile</a></nav>
{body}
</div>
</body>
</html>"#
    )
}

pub fn index() -> String {
    layout(
        "IoT Center",
        r"    <h1>IoT Center</h1>
    <p>Write random readings to InfluxDB and graph them.</p>
    <p><a href='/login'>Log in</a> to get started, or <a href='/signup'>sign up</a> with your InfluxDB tokens.</p>",
    )
}

pub fn login() -> String {
    layout(
        "Log in",
        r#"    <h1>Log in</h1>
    <form method="post" action="/login">
        <input type="email" name="email" placeholder="Email" required>
        <input type="password" name="password" placeholder="Password" required>
        <button type="submit">Log in</button>
    </form>"#,
    )
}

pub fn signup() -> String {
    layout(
        "Sign up",
        r#"    <h1>Sign up</h1>
    <form method="post" action="/signup">
        <input type="email" name="email" placeholder="Email" required>
        <input type="text" name="name" placeholder="Name" required>
        <input type="password" name="password" placeholder="Password" required>
        <input type="text" name="readToken" placeholder="InfluxDB read token" required>
        <input type="text" name="writeToken" placeholder="InfluxDB write token" required>
        <button type="submit">Sign up</button>
    </form>"#,
    )
}

/// Profile page with buttons that write a random point and graph the bucket.
pub fn profile(name: &str) -> String {
    let name = htmlescape::encode_minimal(name);
    let body = format!(
        r#"    <h1>Hello, {name}</h1>
    <button onclick="writeData()">Write data</button>
    <button onclick="queryData()">Query data</button>
    <a href="/logout">Log out</a>
    <div id="status"></div>
    <div id="graph"></div>
    <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
    <script>
        const status = document.getElementById('status');
        async function writeData() {{
            const res = await fetch('/graph_write_data', {{ method: 'POST' }});
            status.textContent = res.ok ? 'Wrote a random point.' : 'Write failed: ' + await res.text();
        }}
        async function queryData() {{
            const res = await fetch('/graph_query_data');
            if (!res.ok) {{
                status.textContent = 'Query failed: ' + await res.text();
                return;
            }}
            const data = await res.json();
            Plotly.newPlot('graph', data);
            status.textContent = 'Graphed ' + data[0].y.length + ' points.';
        }}
    </script>"#
    );
    layout("Profile", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_escapes_the_user_name() {
        let page = profile("<script>alert(1)</script>");
        assert!(page.contains("Hello, &lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!page.contains("Hello, <script>"));
    }

    #[test]
    fn signup_form_uses_stored_column_names() {
        let page = signup();
        assert!(page.contains(r#"name="readToken""#));
        assert!(page.contains(r#"name="writeToken""#));
    }
}
