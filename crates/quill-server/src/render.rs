//! HTML rendering for the blog pages.
//!
//! Small builder functions over a shared layout. All user-supplied content
//! (usernames, titles, bodies, form echoes) passes through [`escape`] before
//! it reaches the page.

use quill_auth::User;
use quill_posts::{PostFeed, PostListing};

/// Escapes text for safe interpolation into HTML content and attributes.
pub fn escape(s: &str) -> String {
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

fn nav(user: Option<&User>) -> String {
    match user {
        Some(user) => format!(
            "<li><span>{}</span></li>\n    <li><a href=\"/auth/logout\">Log Out</a></li>",
            escape(&user.username)
        ),
        None => "<li><a href=\"/auth/register\">Register</a></li>\n    \
                 <li><a href=\"/auth/login\">Log In</a></li>"
            .to_string(),
    }
}

fn flash(message: Option<&str>) -> String {
    match message {
        Some(message) => format!("<div class=\"flash\">{}</div>\n", escape(message)),
        None => String::new(),
    }
}

/// The shared page layout: title, nav, header with an optional action link,
/// an optional flash notice, and the page content.
fn layout(
    title: &str,
    user: Option<&User>,
    action: &str,
    notice: Option<&str>,
    content: &str,
) -> String {
    format!(
        "<!doctype html>\n\
         <html>\n\
         <head><title>{title} - Quill</title></head>\n\
         <body>\n\
         <nav>\n  <h1><a href=\"/\">Quill</a></h1>\n  <ul>\n    {nav}\n  </ul>\n</nav>\n\
         <section class=\"content\">\n\
         <header>\n  <h1>{title}</h1>\n  {action}\n</header>\n\
         {flash}\
         {content}\n\
         </section>\n\
         </body>\n\
         </html>\n",
        title = escape(title),
        nav = nav(user),
        action = action,
        flash = flash(notice),
        content = content,
    )
}

fn article(post: &PostListing, user: Option<&User>) -> String {
    let edit_link = match user {
        Some(user) if user.id == post.author_id => {
            format!("\n    <a class=\"action\" href=\"/{}/update\">Edit</a>", post.id)
        }
        _ => String::new(),
    };

    format!(
        "<article class=\"post\">\n\
         <header>\n\
         <div>\n\
         <h2>{title}</h2>\n\
         <div class=\"about\">by {username} on {date}</div>\n\
         </div>{edit_link}\n\
         </header>\n\
         <p class=\"body\">{body}</p>\n\
         </article>",
        title = escape(&post.title),
        username = escape(&post.username),
        date = escape(&post.created_date()),
        edit_link = edit_link,
        body = escape(&post.body),
    )
}

/// The index page: the post feed, newest first.
///
/// A degraded feed renders the "Failed to load posts." notice while the rest
/// of the page (nav included) stays intact.
pub fn index_page(feed: &PostFeed, user: Option<&User>) -> String {
    let action = if user.is_some() {
        "<a class=\"action\" href=\"/create\">New</a>"
    } else {
        ""
    };

    let notice = feed.load_failed.then_some("Failed to load posts.");

    let content = feed
        .posts
        .iter()
        .map(|post| article(post, user))
        .collect::<Vec<_>>()
        .join("\n<hr>\n");

    layout("Posts", user, action, notice, &content)
}

fn credentials_form(submit: &str) -> String {
    format!(
        "<form method=\"post\">\n\
         <label for=\"username\">Username</label>\n\
         <input name=\"username\" id=\"username\" required>\n\
         <label for=\"password\">Password</label>\n\
         <input type=\"password\" name=\"password\" id=\"password\" required>\n\
         <input type=\"submit\" value=\"{submit}\">\n\
         </form>"
    )
}

/// The registration form, with an optional error notice.
pub fn register_page(user: Option<&User>, error: Option<&str>) -> String {
    layout("Register", user, "", error, &credentials_form("Register"))
}

/// The login form, with an optional error notice.
pub fn login_page(user: Option<&User>, error: Option<&str>) -> String {
    layout("Log In", user, "", error, &credentials_form("Log In"))
}

fn post_form(title: &str, body: &str, submit: &str) -> String {
    format!(
        "<form method=\"post\">\n\
         <label for=\"title\">Title</label>\n\
         <input name=\"title\" id=\"title\" value=\"{title}\">\n\
         <label for=\"body\">Body</label>\n\
         <textarea name=\"body\" id=\"body\">{body}</textarea>\n\
         <input type=\"submit\" value=\"{submit}\">\n\
         </form>",
        title = escape(title),
        body = escape(body),
        submit = submit,
    )
}

/// The new-post form. `title`/`body` echo the submitted values on a
/// validation re-render.
pub fn create_page(user: &User, error: Option<&str>, title: &str, body: &str) -> String {
    layout("New Post", Some(user), "", error, &post_form(title, body, "Save"))
}

/// The edit form for an existing post, including the delete control.
pub fn update_page(
    user: &User,
    id: i64,
    title: &str,
    body: &str,
    error: Option<&str>,
) -> String {
    let content = format!(
        "{form}\n<hr>\n\
         <form action=\"/{id}/delete\" method=\"post\">\n\
         <input class=\"danger\" type=\"submit\" value=\"Delete\" \
         onclick=\"return confirm('Are you sure?');\">\n\
         </form>",
        form = post_form(title, body, "Save"),
        id = id,
    );

    layout(&format!("Edit \"{title}\""), Some(user), "", error, &content)
}
