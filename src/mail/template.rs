use chrono::TimeDelta;

use super::EmailMessage;

pub const DEFAULT_PRODUCT_NAME: &str = "Looma";
pub const DEFAULT_SUPPORT_EMAIL: &str = "support@looma.com";

/// Product identity used when rendering outbound mail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Branding {
    product: String,
    support_email: String,
}

impl Branding {
    #[must_use]
    pub fn new(product: String, support_email: String) -> Self {
        Self {
            product,
            support_email,
        }
    }

    #[must_use]
    pub fn product(&self) -> &str {
        &self.product
    }

    #[must_use]
    pub fn support_email(&self) -> &str {
        &self.support_email
    }

    /// Render the signup verification email carrying `code`.
    #[must_use]
    pub fn verification_email(&self, to: &str, code: &str, ttl: TimeDelta) -> EmailMessage {
        let product = &self.product;
        let support = &self.support_email;
        let expiry = describe_ttl(ttl);

        let html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{product} Verification Code</title>
</head>
<body style="margin:0;padding:20px;background:#f1f5f9;font-family:'Exo 2',Arial,sans-serif;">
  <div style="max-width:600px;margin:0 auto;background:#ffffff;border-radius:16px;overflow:hidden;">
    <div style="background:#2563eb;padding:40px 30px;text-align:center;color:#ffffff;">
      <h1 style="font-size:28px;font-weight:600;margin:0 0 10px;">Verify Your Email</h1>
      <p style="font-size:16px;margin:0;">Complete your account setup with the code below</p>
    </div>
    <div style="padding:40px 30px;color:#374151;">
      <p style="font-size:18px;">Hello,</p>
      <p style="font-size:16px;color:#6b7280;line-height:1.6;">
        Thank you for choosing {product}! To complete your registration, please use the following verification code:
      </p>
      <div style="background:#f8fafc;border:2px solid #e2e8f0;border-radius:12px;padding:30px;text-align:center;margin:30px 0;">
        <div style="font-size:14px;color:#64748b;text-transform:uppercase;letter-spacing:1px;">Verification Code</div>
        <div style="font-size:42px;font-weight:700;color:#2563eb;letter-spacing:8px;">{code}</div>
      </div>
      <p style="background:#fffbeb;border:1px solid #fed7aa;border-radius:8px;padding:15px;text-align:center;color:#92400e;">
        This code will expire in <strong>{expiry}</strong> for security reasons.
      </p>
      <p style="background:#f0f9ff;border:1px solid #bae6fd;border-radius:8px;padding:15px;color:#0369a1;">
        <strong>Security Tip:</strong> Never share this code with anyone. {product} will never ask for your verification code.
      </p>
    </div>
    <div style="background:#f8fafc;padding:30px;text-align:center;font-size:12px;color:#94a3b8;">
      Need help? Contact <a href="mailto:{support}">{support}</a>.<br>
      This is an automated message, please do not reply to this email.
    </div>
  </div>
</body>
</html>
"#
        );

        let text = format!(
            "VERIFY YOUR {upper} ACCOUNT\n\
             \n\
             Hello,\n\
             \n\
             Thank you for choosing {product}! To complete your registration, please use the following verification code:\n\
             \n\
             Verification Code: {code}\n\
             \n\
             This code will expire in {expiry} for security reasons.\n\
             \n\
             Security Tip: Never share this code with anyone. {product} will never ask for your verification code.\n\
             \n\
             If you need help, contact our support team at {support}\n\
             \n\
             This is an automated message, please do not reply to this email.\n",
            upper = product.to_uppercase(),
        );

        EmailMessage {
            to: to.to_string(),
            subject: format!("Your {product} Verification Code"),
            html,
            text,
        }
    }
}

impl Default for Branding {
    fn default() -> Self {
        Self::new(
            DEFAULT_PRODUCT_NAME.to_string(),
            DEFAULT_SUPPORT_EMAIL.to_string(),
        )
    }
}

fn describe_ttl(ttl: TimeDelta) -> String {
    let minutes = ttl.num_minutes();
    if minutes >= 1 && ttl.num_seconds() % 60 == 0 {
        plural(minutes, "minute")
    } else {
        plural(ttl.num_seconds().max(0), "second")
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
