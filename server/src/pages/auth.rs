use super::make_path;
use common::SIGNUP_BONUS_CREDITS;
use leptos::prelude::*;
use templates::{Banner, Page};

pub fn render_login(base: &str, error: Option<&str>) -> String {
    let mut banners = Vec::new();
    if let Some(error) = error {
        banners.push(Banner::error(error));
    }
    let action = make_path(base, "/login");
    let signup_href = make_path(base, "/signup");

    let content = view! {
        <div class="card">
            <form method="POST" action={action}>
                <label for="email">"Email"</label>
                <input id="email" type="email" name="email" placeholder="your@email.com" required=true/>
                <label for="password">"Password"</label>
                <input id="password" type="password" name="password" required=true/>
                <button type="submit">"Login"</button>
            </form>
        </div>
        <p class="footnote">
            "Don't have an account? "
            <a href={signup_href}>"Sign Up"</a>
        </p>
    };

    Page {
        title: "AI Image Generator - Login".to_string(),
        heading: "AI Image Generator".to_string(),
        credits_badge: None,
        actions: vec![],
        banners,
        content,
    }
    .render()
}

pub fn render_signup(base: &str, error: Option<&str>) -> String {
    let mut banners = vec![Banner::info(format!(
        "Get {SIGNUP_BONUS_CREDITS} free credits on signup!"
    ))];
    if let Some(error) = error {
        banners.push(Banner::error(error));
    }
    let action = make_path(base, "/signup");
    let login_href = make_path(base, "/login");

    let content = view! {
        <div class="card">
            <form method="POST" action={action}>
                <label for="email">"Email"</label>
                <input id="email" type="email" name="email" placeholder="your@email.com" required=true/>
                <label for="password">"Password"</label>
                <input id="password" type="password" name="password" minlength="6" required=true/>
                <p class="footnote">"Minimum 6 characters"</p>
                <button type="submit">"Sign Up"</button>
            </form>
        </div>
        <p class="footnote">
            "Already have an account? "
            <a href={login_href}>"Login"</a>
        </p>
    };

    Page {
        title: "AI Image Generator - Sign Up".to_string(),
        heading: "AI Image Generator".to_string(),
        credits_badge: None,
        actions: vec![],
        banners,
        content,
    }
    .render()
}
