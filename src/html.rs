//! The document loaded into a fresh display surface.

/// Full-viewport preview page: one `.container` for the viewer to attach
/// to, then the viewer script and the bridging script, in that order.
pub fn preview_document(title: &str, viewer_src: &str, bridge_src: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        .container {{
            width: 100%;
            height: 100%;
            position: absolute;
            top: 0px;
            left: 0px;
            right: 0px;
            bottom: 0px;
        }}
    </style>
</head>
<body>
    <div class="container"></div>
    <script src="{viewer}"></script>
    <script src="{bridge}"></script>
</body>
</html>
"#,
        title = escape_html(title),
        viewer = escape_html(viewer_src),
        bridge = escape_html(bridge_src),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
