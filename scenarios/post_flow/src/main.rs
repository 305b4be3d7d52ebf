use breeze_runner::prelude::*;
use serde_json::json;
use std::time::Duration;

const PACING: Duration = Duration::from_millis(100);

fn steps() -> Vec<Step> {
    vec![
        Step::get("Get posts", "/posts")
            .with_check("status 200 (get posts)", |r| r.status() == 200)
            .with_delay(PACING),
        // Everything after this needs the id of the new post.
        Step::post("Create post", "/posts")
            .with_check("status 200 (create post)", |r| r.status() == 200)
            .extract("/id", "post_id")
            .required()
            .with_delay(PACING),
        Step::post("Create comment", "/comments")
            .with_json_body(json!({
                "postId": "{post_id}",
                "comment": "comment from loadtest",
            }))
            .with_check("status 200 (create comment)", |r| r.status() == 200)
            .with_delay(PACING),
        Step::put("View post", "/posts/{post_id}/views")
            .with_check("status 200 (view post)", |r| r.status() == 200)
            .with_delay(PACING),
        Step::put("Like post", "/posts/{post_id}/likes")
            .with_check("status 200 (like post)", |r| r.status() == 200),
    ]
}

fn main() -> BreezeResult<()> {
    let builder = steps().into_iter().fold(
        ScenarioDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME"))
            .with_default_vus(40)
            .with_default_duration_s(10),
        ScenarioDefinitionBuilder::add_step,
    );

    run(builder)?;

    Ok(())
}
