use tracing::info;

use crate::{Database, Result};

pub const DEMO_ADMIN_EMAIL: &str = "admin@marinet.edu";

const DEMO_GROUPS: &[(&str, &str, &str)] = &[
    ("K-Pop Club", "For fans of K-Pop music and culture.", "music-note"),
    ("Science Club", "Discuss scientific discoveries and experiments.", "lightbulb"),
    (
        "Environmental Awareness Club",
        "Promote environmental awareness and sustainability.",
        "tree",
    ),
];

impl Database {
    /// Create the demo admin account and starter groups on an empty install.
    /// Returns false when the admin account already exists.
    pub fn seed_demo(&self, admin_password_hash: &str) -> Result<bool> {
        if self.get_user_by_email(DEMO_ADMIN_EMAIL)?.is_some() {
            return Ok(false);
        }

        let admin = self.create_user("admin", DEMO_ADMIN_EMAIL, admin_password_hash)?;
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET avatar_url = '/static/default_admin_avatar.jpg' WHERE id = ?1",
                [&admin.id],
            )?;
            Ok(())
        })?;

        for &(name, description, icon) in DEMO_GROUPS {
            self.create_group(&admin.id, name, Some(description), Some(icon))?;
        }

        info!("Seeded demo admin and {} groups", DEMO_GROUPS.len());
        Ok(true)
    }
}
