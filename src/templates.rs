use std::sync::LazyLock;

use tera::{Context, Tera};

/// Every page template, embedded so the binary does not depend on its working directory.
const SOURCES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("posts/index.html", include_str!("../templates/posts/index.html")),
    ("posts/group_list.html", include_str!("../templates/posts/group_list.html")),
    ("posts/profile.html", include_str!("../templates/posts/profile.html")),
    ("posts/post_detail.html", include_str!("../templates/posts/post_detail.html")),
    ("posts/create_post.html", include_str!("../templates/posts/create_post.html")),
    ("posts/follow.html", include_str!("../templates/posts/follow.html")),
    ("users/signup.html", include_str!("../templates/users/signup.html")),
    ("users/login.html", include_str!("../templates/users/login.html")),
    ("users/logged_out.html", include_str!("../templates/users/logged_out.html")),
    ("core/404.html", include_str!("../templates/core/404.html")),
    ("core/500.html", include_str!("../templates/core/500.html")),
];

static TEMPLATES: LazyLock<Tera> = LazyLock::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(SOURCES.iter().copied())
        .expect("embedded templates must parse");
    tera
});

pub fn render(name: &str, context: &Context) -> tera::Result<String> {
    TEMPLATES.render(name, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_parse() {
        for (name, _) in SOURCES {
            assert!(TEMPLATES.get_template_names().any(|n| n == *name), "{name} missing");
        }
    }

    #[test]
    fn not_found_page_renders_without_viewer() {
        let html = render("core/404.html", &Context::new()).unwrap();
        assert!(html.contains("404"));
    }
}
