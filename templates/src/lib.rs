use leptos::either::Either;
use leptos::prelude::*;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn page_layout(title: &str, body_html: String) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: monospace; max-width: 960px; margin: 0 auto; padding: 16px; }}
h1 {{ margin-bottom: 4px; }}
.card {{ border: 1px solid #ccc; border-radius: 6px; padding: 16px; margin-bottom: 16px; }}
.banner {{ padding: 8px 12px; border-radius: 6px; margin-bottom: 12px; }}
.banner-error {{ background: #fde8e8; color: #9b1c1c; }}
.banner-info {{ background: #e8f5e9; color: #1b5e20; }}
.banner-warning {{ background: #fff8e1; color: #8d6e00; }}
label {{ display: block; margin-bottom: 4px; font-weight: bold; }}
input, textarea {{ width: 100%; box-sizing: border-box; padding: 6px; margin-bottom: 12px; font-family: monospace; }}
button {{ padding: 6px 16px; cursor: pointer; font-family: monospace; }}
.header {{ display: flex; justify-content: space-between; align-items: center; }}
.credits {{ border: 1px solid #ccc; border-radius: 6px; padding: 4px 10px; }}
.gallery {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 12px; }}
.gallery img {{ width: 100%; aspect-ratio: 1; object-fit: cover; border-radius: 4px; }}
.gallery .prompt {{ font-size: 0.9em; margin: 6px 0 2px; }}
.gallery .date {{ font-size: 0.8em; color: #888; }}
.empty-state {{ color: #888; text-align: center; padding: 24px 0; }}
.footnote {{ color: #666; margin-top: 12px; text-align: center; }}
</style>
</head>
<body>
{body_html}
</body>
</html>"#,
        title = html_escape(title),
        body_html = body_html
    )
}

#[derive(Clone, Copy, PartialEq)]
pub enum BannerKind {
    Error,
    Info,
    Warning,
}

pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

impl Banner {
    pub fn error(text: impl ToString) -> Self {
        Self {
            kind: BannerKind::Error,
            text: text.to_string(),
        }
    }

    pub fn info(text: impl ToString) -> Self {
        Self {
            kind: BannerKind::Info,
            text: text.to_string(),
        }
    }

    pub fn warning(text: impl ToString) -> Self {
        Self {
            kind: BannerKind::Warning,
            text: text.to_string(),
        }
    }

    fn css_class(&self) -> &'static str {
        match self.kind {
            BannerKind::Error => "banner banner-error",
            BannerKind::Info => "banner banner-info",
            BannerKind::Warning => "banner banner-warning",
        }
    }
}

pub struct HeaderAction {
    pub label: String,
    pub href: String,
}

impl HeaderAction {
    pub fn new(label: impl ToString, href: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            href: href.to_string(),
        }
    }
}

pub struct Page<C: IntoView = ()> {
    pub title: String,
    pub heading: String,
    pub credits_badge: Option<i64>,
    pub actions: Vec<HeaderAction>,
    pub banners: Vec<Banner>,
    pub content: C,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            title: String::new(),
            heading: String::new(),
            credits_badge: None,
            actions: Vec::new(),
            banners: Vec::new(),
            content: (),
        }
    }
}

impl<C: IntoView> Page<C> {
    pub fn render(self) -> String {
        let Page {
            title,
            heading,
            credits_badge,
            actions,
            banners,
            content,
        } = self;

        let body = view! {
            <div class="header">
                <h1>{heading}</h1>
                <div>
                    {credits_badge.map(|credits| {
                        let badge = format!("Credits: {credits}");
                        view! {
                            <span class="credits">{badge}</span>
                            " "
                        }
                    })}
                    {actions.into_iter().map(|a| {
                        view! { <a href={a.href}>{a.label}</a> " " }
                    }).collect::<Vec<_>>()}
                </div>
            </div>

            {banners.into_iter().map(|banner| {
                let class = banner.css_class();
                view! { <div class={class}>{banner.text}</div> }
            }).collect::<Vec<_>>()}

            {content}
        };

        page_layout(&title, body.to_html())
    }
}

/// Gallery entry: thumbnail, prompt caption, creation time.
pub struct GalleryItem {
    pub image_url: String,
    pub prompt: String,
    pub created_at: String,
}

pub fn gallery(items: Vec<GalleryItem>) -> impl IntoView {
    if items.is_empty() {
        Either::Left(view! {
            <p class="empty-state">"No images generated yet. Create your first image above!"</p>
        })
    } else {
        Either::Right(view! {
            <div class="gallery">
                {items.into_iter().map(|item| {
                    view! {
                        <div class="card">
                            <img src={item.image_url} alt={item.prompt.clone()}/>
                            <p class="prompt">{item.prompt}</p>
                            <p class="date">{item.created_at}</p>
                        </div>
                    }
                }).collect::<Vec<_>>()}
            </div>
        })
    }
}
