// Recording render backend shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use splash_core::envelope::Envelope;
use splash_core::gpu::{
    Blend, Capabilities, Dest, FieldFormat, GpuError, Keyword, Output, ProgramDesc, ProgramKind,
    RenderBackend, Target, TargetDesc,
};
use splash_core::note::Note;

#[derive(Debug)]
pub struct MockTarget {
    pub id: usize,
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: FieldFormat,
}

impl Target for MockTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MockProgram {
    pub id: usize,
    pub kind: ProgramKind,
    pub output: Output,
    pub blend: Blend,
    pub keywords: Vec<Keyword>,
}

/// One recorded draw. `dest` is `None` for the screen.
#[derive(Clone, Debug)]
pub struct Blit {
    pub kind: ProgramKind,
    pub output: Output,
    pub blend: Blend,
    pub sources: Vec<usize>,
    pub dest: Option<usize>,
    pub uniforms: Vec<u8>,
}

pub struct MockBackend {
    pub caps: Capabilities,
    pub size: (u32, u32),
    pub targets: Vec<TargetDesc>,
    pub programs: Vec<MockProgram>,
    pub blits: Vec<Blit>,
    pub fail_on: Option<ProgramKind>,
}

impl MockBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            caps: Capabilities::default(),
            size: (width, height),
            targets: Vec::new(),
            programs: Vec::new(),
            blits: Vec::new(),
            fail_on: None,
        }
    }

    pub fn without_linear_filtering(mut self) -> Self {
        self.caps.linear_filtering = false;
        self
    }

    pub fn kinds(&self) -> Vec<ProgramKind> {
        self.blits.iter().map(|b| b.kind).collect()
    }

    pub fn count(&self, kind: ProgramKind) -> usize {
        self.blits.iter().filter(|b| b.kind == kind).count()
    }

    pub fn take_blits(&mut self) -> Vec<Blit> {
        std::mem::take(&mut self.blits)
    }

    pub fn programs_of(&self, kind: ProgramKind) -> Vec<&MockProgram> {
        self.programs.iter().filter(|p| p.kind == kind).collect()
    }
}

impl RenderBackend for MockBackend {
    type Target = MockTarget;
    type Program = MockProgram;

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_target(&mut self, desc: &TargetDesc) -> MockTarget {
        self.targets.push(*desc);
        MockTarget {
            id: self.targets.len() - 1,
            label: desc.label,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        }
    }

    fn compile_program(&mut self, desc: &ProgramDesc<'_>) -> Result<MockProgram, GpuError> {
        if self.fail_on == Some(desc.kind) {
            return Err(GpuError::Compile {
                program: desc.kind.name(),
                message: "rejected by test".into(),
            });
        }
        let program = MockProgram {
            id: self.programs.len(),
            kind: desc.kind,
            output: desc.output,
            blend: desc.blend,
            keywords: desc.keywords.to_vec(),
        };
        self.programs.push(program.clone());
        Ok(program)
    }

    fn blit(
        &mut self,
        program: &MockProgram,
        uniforms: &[u8],
        sources: &[&MockTarget],
        dest: Dest<'_, MockTarget>,
    ) {
        self.blits.push(Blit {
            kind: program.kind,
            output: program.output,
            blend: program.blend,
            sources: sources.iter().map(|t| t.id).collect(),
            dest: match dest {
                Dest::Target(t) => Some(t.id),
                Dest::Screen => None,
            },
            uniforms: uniforms.to_vec(),
        });
    }
}

pub fn shared_envelope() -> Arc<Envelope> {
    Arc::new(Envelope::default())
}

pub fn note(pitch: u8, velocity: u8, now: f64) -> Note {
    Note::new(pitch, velocity, shared_envelope(), now)
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
