/// HTML pages for the home screen and dashboard
use crate::models::Gist;
use std::fmt::Write;

const STYLE: &str = r#"
    body { padding-top: 20px; padding-bottom: 20px; }
    .header { padding: 0 15px 19px; border-bottom: 1px solid #e5e5e5; margin-bottom: 30px; }
    .header h3 { margin: 0; line-height: 40px; }
    .jumbotron { text-align: center; border-bottom: 1px solid #e5e5e5; }
    .marketing { margin: 40px 0; }
    @media (min-width: 768px) { .container { max-width: 730px; } }
"#;

fn layout(title: &str, nav: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta http-equiv="X-UA-Compatible" content="IE=edge">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <link href="//maxcdn.bootstrapcdn.com/bootstrap/3.2.0/css/bootstrap.min.css" rel="stylesheet">
    <style>{style}</style>
  </head>
  <body class="index">
    <div class="container">
      <div class="header">
        <ul class="nav nav-pills pull-right">{nav}</ul>
        <h3 class="text-muted">{title}</h3>
      </div>
{body}
    </div>
  </body>
</html>
"#,
        title = escape_html(title),
        style = STYLE,
        nav = nav,
        body = body,
    )
}

/// Landing page for anonymous visitors
pub fn index(provider_name: &str) -> String {
    let body = format!(
        r#"      <div class="jumbotron">
        <h1>Embed Your Gists</h1>
        <p class="lead">{name} is a simple service for mirroring GitHub gists and allowing you to embed them on other sites.</p>
        <p><a class="btn btn-lg btn-success" href="/_/login" role="button">Sign in with GitHub</a></p>
      </div>
      <div class="row marketing">
        <div class="col-lg-6">
          <h4>oEmbed API</h4>
          <p>Sites can use the <a href="http://oembed.com/">oEmbed</a> API to create embeddable iframes to host your gists.</p>
        </div>
        <div class="col-lg-6">
          <h4>Chromeless</h4>
          <p>Gists are displayed as-is with no branding or border. Simply drop them into your site and style them however you'd like.</p>
        </div>
      </div>"#,
        name = escape_html(provider_name)
    );

    layout(
        provider_name,
        r#"<li><a href="/_/login">Sign in</a></li>"#,
        &body,
    )
}

/// Dashboard listing hosted gists and gists available on GitHub
pub fn dashboard(provider_name: &str, hosted: &[Gist], recent: &[Gist]) -> String {
    let mut body = String::new();

    body.push_str("      <h3>Hosted Gists</h3>\n");
    gist_table(
        &mut body,
        hosted,
        &format!("You do not have any gists hosted on {}.", escape_html(provider_name)),
    );

    body.push_str("      <h3>Recent Gists</h3>\n");
    gist_table(&mut body, recent, "You do not have any gists available on GitHub.");

    layout(
        provider_name,
        r#"<li><a href="/_/logout">Log out</a></li>"#,
        &body,
    )
}

fn gist_table(out: &mut String, gists: &[Gist], empty_message: &str) {
    if gists.is_empty() {
        let _ = writeln!(
            out,
            r#"      <div class="row"><div class="col-lg-12"><p>{}</p></div></div>"#,
            empty_message
        );
        return;
    }

    out.push_str(
        r#"      <table class="table">
        <thead><tr><th class="col-md-9">Description</th><th class="col-md-3">Created</th></tr></thead>
        <tbody>
"#,
    );
    for gist in gists {
        let title = if gist.description.is_empty() {
            "<em>Untitled</em>".to_string()
        } else {
            escape_html(&gist.description)
        };
        let created = gist
            .created_at
            .map(|t| t.format("%b %e %H:%M:%S").to_string())
            .unwrap_or_default();

        let _ = writeln!(
            out,
            r#"          <tr><td class="col-lg-9"><a href="/{id}/" target="_blank">{title}</a></td><td class="col-lg-3">{created}</td></tr>"#,
            id = urlencoding::encode(&gist.id),
            title = title,
            created = created,
        );
    }
    out.push_str("        </tbody>\n      </table>\n");
}

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
