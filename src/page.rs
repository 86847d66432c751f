//! Server-side rendering of the demo page.

/// Cookie holding the user identifier that drives bucket stability.
pub const UID_COOKIE: &str = "uid";

/// Bucket value served when the experiment gives no bucket.
pub const DEFAULT_BUCKET: &str = "";

/// Experiment evaluated by the page.
pub const EXPERIMENT_NAME: &str = "statsig_example";

/// Experiment parameter holding the bucket label.
pub const BUCKET_FIELD: &str = "bucket";

const SCREENSHOT_PATH: &str = "/example.png";

const BROWSER_SDK_URL: &str = "https://cdn.jsdelivr.net/npm/statsig-js/build/statsig-prod-web-sdk.min.js";

const ADAPTER_SNIPPET: &str = r#"let edge_config = Arc::new(HttpEdgeConfigClient::from_connection_string(
    &std::env::var("EDGE_CONFIG")?,
)?);
let adapter = EdgeConfigDataAdapter::new(edge_config, std::env::var("EDGE_CONFIG_ITEM_KEY")?);

let client = ClientConfig::from_secret_key(std::env::var("STATSIG_SERVER_API_KEY")?)
    .data_adapter(adapter)
    .initialize()
    .await?;"#;

const EXPERIMENT_SNIPPET: &str = r#"let experiment = client.get_config(&User::new(uid), "statsig_example");
let bucket: String = experiment.get_value("bucket", String::new());

// Send exposures before the response goes out.
client.flush().await?;"#;

#[derive(Debug, Clone, PartialEq)]
pub struct PageProps {
    pub bucket: String,
    /// Public key for the browser SDK.
    pub client_key: String,
}

pub fn render_page(props: &PageProps) -> String {
    let assignment = if props.bucket == DEFAULT_BUCKET {
        format!(
            "<p class=\"missing\">No bucket was assigned. Create an experiment named \
             <code>{experiment}</code> with a string parameter <code>{field}</code>, publish its \
             config specs to the Edge Config item, and reload this page.</p>",
            experiment = EXPERIMENT_NAME,
            field = BUCKET_FIELD,
        )
    } else {
        format!(
            "<p>You are in bucket <strong class=\"bucket\">{}</strong>.</p>",
            escape_html(&props.bucket)
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Experiments with Edge Config</title>
</head>
<body>
<main>
<h1>Experiments with Edge Config</h1>
<p>This page evaluates the <code>{experiment}</code> experiment on the server. The experiment
definition is read from Edge Config through a data adapter, so no request to the experimentation
API is needed before the page renders.</p>
{assignment}
<p>Your assignment is stable while the <code>{cookie}</code> cookie is set. Reset it to get a new
identifier and possibly a different bucket.</p>
<button type="button" id="reset">Reset bucket</button>
<h2>Configuring the experiment</h2>
<p>Add the experiment with one group per bucket:</p>
<img src="{screenshot}" alt="Experiment setup with one group per bucket" width="640">
<h2>Reading config specs from Edge Config</h2>
<pre><code>{adapter_snippet}</code></pre>
<h2>Evaluating the experiment</h2>
<pre><code>{experiment_snippet}</code></pre>
</main>
<script>
document.getElementById("reset").addEventListener("click", function () {{
  document.cookie = "{cookie}=; Path=/; Max-Age=0";
  window.location.reload();
}});
</script>
<script src="{sdk_url}"></script>
<script>
(function () {{
  var match = document.cookie.match(/(?:^|;\s*){cookie}=([^;]*)/);
  var user = {{ userID: match ? decodeURIComponent(match[1]) : undefined }};
  statsig.initialize({client_key}, user).then(function () {{
    statsig.logEvent("page_view");
  }});
}})();
</script>
</body>
</html>
"#,
        experiment = EXPERIMENT_NAME,
        assignment = assignment,
        cookie = UID_COOKIE,
        screenshot = SCREENSHOT_PATH,
        adapter_snippet = escape_html(ADAPTER_SNIPPET),
        experiment_snippet = escape_html(EXPERIMENT_SNIPPET),
        sdk_url = BROWSER_SDK_URL,
        client_key = script_string(&props.client_key),
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
            c => escaped.push(c),
        }
    }
    escaped
}

/// JavaScript string literal safe to embed inside a `<script>` element.
fn script_string(value: &str) -> String {
    serde_json::Value::from(value)
        .to_string()
        .replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(bucket: &str) -> PageProps {
        PageProps {
            bucket: bucket.to_owned(),
            client_key: "client-key".to_owned(),
        }
    }

    #[test]
    fn renders_bucket() {
        let html = render_page(&props("b"));

        assert!(html.contains(r#"<strong class="bucket">b</strong>"#));
        assert!(!html.contains("No bucket was assigned"));
    }

    #[test]
    fn default_bucket_renders_instructions() {
        let html = render_page(&props(DEFAULT_BUCKET));

        assert!(html.contains("No bucket was assigned"));
        assert!(html.contains("<code>statsig_example</code>"));
        assert!(!html.contains(r#"class="bucket""#));
    }

    #[test]
    fn renders_reset_button_and_snippets() {
        let html = render_page(&props("a"));

        assert!(html.contains(r#"<button type="button" id="reset">"#));
        assert!(html.contains("uid=; Path=/; Max-Age=0"));
        assert!(html.contains("EdgeConfigDataAdapter::new"));
        assert!(html.contains("get_value(&quot;bucket&quot;, String::new())"));
        assert!(html.contains(r#"statsig.initialize("client-key", user)"#));
        assert!(html.contains(r#"statsig.logEvent("page_view")"#));
    }

    #[test]
    fn escapes_untrusted_values() {
        let html = render_page(&PageProps {
            bucket: "<script>alert(1)</script>".to_owned(),
            client_key: "key\"</script><script>".to_owned(),
        });

        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains(r#""key\"<\/script><script>""#));
    }
}
