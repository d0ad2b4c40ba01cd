use super::make_path;
use common::{GeneratedImage, Profile};
use leptos::prelude::*;
use templates::{gallery, Banner, GalleryItem, HeaderAction, Page};

pub fn render(
    base: &str,
    profile: &Profile,
    images: &[GeneratedImage],
    error: Option<&str>,
) -> String {
    let mut banners = Vec::new();
    if let Some(error) = error {
        banners.push(Banner::error(error));
    }
    if profile.credits < 1 {
        banners.push(Banner::warning(
            "You have no credits left. Purchase more credits to continue generating images.",
        ));
    }

    let action = make_path(base, "/generate");
    let items: Vec<GalleryItem> = images
        .iter()
        .map(|image| GalleryItem {
            image_url: image.image_url.clone(),
            prompt: image.prompt.clone(),
            created_at: image.created_at.clone(),
        })
        .collect();

    let signed_in_as = format!("Signed in as {}", profile.email);

    let content = view! {
        <p class="footnote">{signed_in_as}</p>
        <div class="card">
            <h2>"Generate Image"</h2>
            <form method="POST" action={action}>
                <label for="prompt">"Enter your prompt"</label>
                <textarea
                    id="prompt"
                    name="prompt"
                    rows="4"
                    placeholder="A beautiful sunset over mountains..."
                ></textarea>
                <button type="submit">"Generate Image (1 Credit)"</button>
            </form>
        </div>
        <div class="card">
            <h2>"Your Generated Images"</h2>
            {gallery(items)}
        </div>
    };

    Page {
        title: "AI Image Generator - Dashboard".to_string(),
        heading: "AI Image Generator".to_string(),
        credits_badge: Some(profile.credits),
        actions: vec![HeaderAction::new("Logout", make_path(base, "/logout"))],
        banners,
        content,
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile(credits: i64) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            credits,
            created_at: "2026-01-01".to_string(),
        }
    }

    fn image(prompt: &str) -> GeneratedImage {
        GeneratedImage {
            image_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            image_url: format!("https://picsum.photos/seed/{prompt}-1/512/512"),
            created_at: "2026-01-02 10:00".to_string(),
        }
    }

    #[test]
    fn render_shows_credits_and_logout() {
        let html = render("/", &profile(20), &[], None);
        assert!(html.contains("Credits: 20"));
        assert!(html.contains("Signed in as alice@example.com"));
        assert!(html.contains(r#"<a href="/logout">"#));
        assert!(html.contains("Generate Image (1 Credit)"));
    }

    #[test]
    fn render_empty_gallery_state() {
        let html = render("/", &profile(20), &[], None);
        assert!(html.contains("No images generated yet"));
    }

    #[test]
    fn render_gallery_items() {
        let html = render("/", &profile(19), &[image("sunset")], None);
        assert!(html.contains("sunset"));
        assert!(html.contains("picsum.photos"));
        assert!(!html.contains("No images generated yet"));
    }

    #[test]
    fn render_zero_credit_warning() {
        let html = render("/", &profile(0), &[], None);
        assert!(html.contains("banner-warning"));
        assert!(html.contains("You have no credits left."));
    }

    #[test]
    fn render_positive_balance_has_no_warning() {
        let html = render("/", &profile(1), &[], None);
        assert!(!html.contains("banner-warning"));
    }

    #[test]
    fn render_error_banner() {
        let html = render("/", &profile(5), &[], Some("Prompt is required"));
        assert!(html.contains("banner-error"));
        assert!(html.contains("Prompt is required"));
    }

    #[test]
    fn render_honors_base_path() {
        let html = render("/studio", &profile(5), &[], None);
        assert!(html.contains(r#"action="/studio/generate""#));
        assert!(html.contains(r#"<a href="/studio/logout">"#));
    }
}
