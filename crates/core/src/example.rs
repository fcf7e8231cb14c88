//! The sample document shown to users who ask what the input should look like.

/// Example slide document.
pub const EXAMPLE_TEXT: &str = "\
Slide 1: Introduction
- Welcome to our presentation
- Today's agenda
- Key topics

Slide 2: Main Points
- First important point
- Second important point
- Supporting details

Note: Each slide starts with 'Slide X:' followed by the title.
Each bullet point starts with a dash (-).";
