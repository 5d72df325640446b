//! HTML documentation served at `/`

const STYLE: &str = r#"
    body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }
    h1 { color: #2c3e50; }
    h2 { color: #3498db; margin-top: 30px; }
    pre { background-color: #f5f5f5; padding: 15px; border-radius: 5px; overflow-x: auto; }
    code { font-family: Consolas, Monaco, 'Andale Mono', monospace; }
    .endpoint { background-color: #e8f4fc; padding: 10px; border-left: 5px solid #3498db; margin-bottom: 20px; }
    .method { font-weight: bold; background-color: #3498db; color: white; padding: 3px 8px; border-radius: 3px; }
"#;

struct Endpoint {
    method: &'static str,
    path: &'static str,
    summary: &'static str,
    example: &'static str,
}

const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        method: "GET",
        path: "/api/health",
        summary: "Check if the API is running.",
        example: "curl {base}/api/health",
    },
    Endpoint {
        method: "GET",
        path: "/api/videos/{videoId}",
        summary: "Scrape a video and return its information.",
        example: "curl {base}/api/videos/9q4yh8ji5k4w",
    },
    Endpoint {
        method: "GET",
        path: "/api/videos/{videoId}/cookies",
        summary: "Get cookies received while scraping a video.",
        example: "curl {base}/api/videos/9q4yh8ji5k4w/cookies",
    },
    Endpoint {
        method: "GET",
        path: "/api/videos/{videoId}/headers",
        summary: "Get request and response headers of a video scrape.",
        example: "curl {base}/api/videos/9q4yh8ji5k4w/headers",
    },
    Endpoint {
        method: "GET",
        path: "/api/videos",
        summary: "List scraped and downloaded videos.",
        example: "curl {base}/api/videos",
    },
    Endpoint {
        method: "POST",
        path: "/api/videos/{videoId}/download",
        summary: "Download a source with ffmpeg. Body fields sourceIndex and fileName are optional.",
        example: "curl -X POST -H 'Content-Type: application/json' -d '{\"sourceIndex\":0}' {base}/api/videos/9q4yh8ji5k4w/download",
    },
    Endpoint {
        method: "DELETE",
        path: "/api/videos/{videoId}",
        summary: "Delete a video and everything stored for it.",
        example: "curl -X DELETE {base}/api/videos/9q4yh8ji5k4w",
    },
];

/// Render the documentation page with examples against `base`
pub fn docs_page(base: &str) -> String {
    let mut endpoints = String::new();
    for endpoint in ENDPOINTS {
        endpoints.push_str(&format!(
            r#"
  <div class="endpoint">
    <p><span class="method">{}</span> <code>{}</code></p>
    <p>{}</p>
    <pre><code>{}</code></pre>
  </div>
"#,
            endpoint.method,
            endpoint.path,
            endpoint.summary,
            endpoint.example.replace("{base}", base),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Video Scraper API</title>
  <style>{style}</style>
</head>
<body>
  <h1>Video Scraper API</h1>
  <p>A RESTful API for scraping and downloading videos.</p>

  <h2>API Endpoints</h2>
{endpoints}
  <h2>Getting Started</h2>
  <ol>
    <li>Find a video ID you want to scrape</li>
    <li>Get video information using the GET endpoint</li>
    <li>Access the video sources and other information from the response</li>
  </ol>

  <p>All downloaded videos are accessible at <code>/downloads/{{videoId}}/{{fileName}}</code></p>
</body>
</html>
"#,
        style = STYLE,
        endpoints = endpoints,
    )
}
