use askama::Template;
use verity_core::EmailTemplate;

#[derive(Template)]
#[template(path = "emails/email_verification.html")]
struct EmailVerificationHtml<'a> {
    display_name: &'a str,
    verify_url: &'a str,
    app_name: &'a str,
}

#[derive(Template)]
#[template(path = "emails/email_verification.txt")]
struct EmailVerificationText<'a> {
    display_name: &'a str,
    verify_url: &'a str,
    app_name: &'a str,
}

/// HTML and plain-text bodies of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub html_body: String,
    pub text_body: String,
}

pub fn render(template: &EmailTemplate) -> Result<RenderedEmail, askama::Error> {
    match template {
        EmailTemplate::EmailVerification {
            display_name,
            verify_url,
            app_name,
        } => Ok(RenderedEmail {
            html_body: EmailVerificationHtml {
                display_name,
                verify_url,
                app_name,
            }
            .render()?,
            text_body: EmailVerificationText {
                display_name,
                verify_url,
                app_name,
            }
            .render()?,
        }),
    }
}
