use crate::studio::options::GenerationOptions;

pub fn outfit_from_text_prompt(description: &str) -> String {
    format!(
        "A high-resolution, 4k image of a single piece of clothing: \"{description}\". \
The clothing should be displayed on a neutral, grey mannequin against a plain white background. \
The style should be that of a professional fashion catalog photo, with clear lighting that showcases the texture and details of the fabric. \
Do not include any human models or distracting elements."
    )
}

fn body_instruction(body_measurements: Option<&str>) -> String {
    match body_measurements {
        Some(measurements) => format!("use the exact body measurements \"{measurements}\""),
        None => "infer the body measurements (bust, waist, hips) from the first character image"
            .to_string(),
    }
}

pub fn outfit_change_prompt(options: &GenerationOptions) -> String {
    let body = body_instruction(options.body_measurements.as_deref());
    format!(
        "Create a high-quality, 4K resolution image. \
From the first character image, use only the face and hair as reference. \
For the body shape, {body}. \
Completely ignore the character's original pose. \
Apply the outfit from the second image to the character, making sure the details and fabric texture of the outfit are clearly rendered. \
Create a new image of the character wearing the new outfit in the pose \"{pose}\" with the camera angle \"{angle}\". \
Place the character on a plain white background. \
The art style must be detailed anime, with cinematic lighting and crisp linework. \
Important: only generate the image, do not write any text.",
        pose = options.pose,
        angle = options.camera_angle,
    )
}
